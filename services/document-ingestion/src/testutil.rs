//! Test fixtures: minimal but structurally valid PDFs built in memory.

/// Build a single-page PDF with `body` as its text layer, complete with a
/// correct xref table so strict parsers accept it.
pub fn text_pdf(body: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", body);
    let objects = [
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        "2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_string(),
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>\nendobj\n"
            .to_string(),
        format!(
            "4 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            stream.len(),
            stream
        ),
        "5 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n".to_string(),
    ];

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    for object in &objects {
        offsets.push(buf.len());
        buf.extend_from_slice(object.as_bytes());
    }

    let xref_pos = buf.len();
    let mut tail = String::from("xref\n0 6\n0000000000 65535 f \n");
    for offset in &offsets {
        tail.push_str(&format!("{:010} 00000 n \n", offset));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size 6 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        xref_pos
    ));
    buf.extend_from_slice(tail.as_bytes());
    buf
}

/// A PDF whose only page has no text layer at all, as produced by scanning.
pub fn image_only_pdf() -> Vec<u8> {
    let objects = [
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        "2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_string(),
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n".to_string(),
    ];

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    for object in &objects {
        offsets.push(buf.len());
        buf.extend_from_slice(object.as_bytes());
    }

    let xref_pos = buf.len();
    let mut tail = String::from("xref\n0 4\n0000000000 65535 f \n");
    for offset in &offsets {
        tail.push_str(&format!("{:010} 00000 n \n", offset));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        xref_pos
    ));
    buf.extend_from_slice(tail.as_bytes());
    buf
}
