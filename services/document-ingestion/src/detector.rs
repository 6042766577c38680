//! Document Type Detector
//!
//! Classifies raw upload bytes as a text-based PDF, an image-based PDF or a
//! raster image. Deterministic and side-effect-free: no network calls, no
//! mutation. A malformed PDF classifies as image-based, which routes it to
//! the OCR path instead of silently losing content.

use meridian_models::{FileKind, PdfType};

/// Detection outcome consumed by the extraction router.
#[derive(Debug, Clone, Copy)]
pub struct DetectedType {
    pub kind: FileKind,
    pub pdf_type: PdfType,
    pub page_count: usize,
}

pub struct TypeDetector {
    /// Extracted characters per page below which the text layer is
    /// considered unusable. Tunable; validated empirically.
    min_chars_per_page: usize,
}

impl TypeDetector {
    pub fn new(min_chars_per_page: usize) -> Self {
        Self { min_chars_per_page }
    }

    pub fn detect(&self, data: &[u8], declared_mime: &str) -> DetectedType {
        if is_pdf(data, declared_mime) {
            self.detect_pdf(data)
        } else {
            // Raster images always go through OCR.
            DetectedType {
                kind: FileKind::Image,
                pdf_type: PdfType::ImageBased,
                page_count: 1,
            }
        }
    }

    fn detect_pdf(&self, data: &[u8]) -> DetectedType {
        let page_count = match lopdf::Document::load_mem(data) {
            Ok(doc) => doc.get_pages().len().max(1),
            Err(e) => {
                tracing::debug!(error = %e, "PDF structure unreadable, treating as image-based");
                return DetectedType {
                    kind: FileKind::Pdf,
                    pdf_type: PdfType::ImageBased,
                    page_count: 1,
                };
            }
        };

        let char_count = match pdf_extract::extract_text_from_mem(data) {
            Ok(text) => text.chars().filter(|c| !c.is_whitespace()).count(),
            Err(e) => {
                tracing::debug!(error = %e, "Text-layer extraction failed, treating as image-based");
                0
            }
        };

        let pdf_type = if char_count >= self.min_chars_per_page * page_count {
            PdfType::TextBased
        } else {
            PdfType::ImageBased
        };

        DetectedType {
            kind: FileKind::Pdf,
            pdf_type,
            page_count,
        }
    }
}

fn is_pdf(data: &[u8], declared_mime: &str) -> bool {
    data.starts_with(b"%PDF-") || declared_mime.to_lowercase().contains("pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{image_only_pdf, text_pdf};

    #[test]
    fn test_garbage_bytes_are_image_based() {
        let detector = TypeDetector::new(100);
        let detected = detector.detect(b"%PDF-1.4 not actually a pdf", "application/pdf");
        assert_eq!(detected.kind, FileKind::Pdf);
        assert_eq!(detected.pdf_type, PdfType::ImageBased);
    }

    #[test]
    fn test_png_magic_is_image() {
        let detector = TypeDetector::new(100);
        let png = [0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let detected = detector.detect(&png, "image/png");
        assert_eq!(detected.kind, FileKind::Image);
        assert_eq!(detected.pdf_type, PdfType::ImageBased);
    }

    #[test]
    fn test_jpeg_by_declared_mime() {
        let detector = TypeDetector::new(100);
        let detected = detector.detect(&[0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg");
        assert_eq!(detected.kind, FileKind::Image);
    }

    #[test]
    fn test_sparse_text_pdf_is_image_based() {
        // A few characters on one page is below any sane density threshold;
        // scanned certificates often carry a stray OCR artifact or two.
        let detector = TypeDetector::new(100);
        let detected = detector.detect(&text_pdf("x"), "application/pdf");
        assert_eq!(detected.kind, FileKind::Pdf);
        assert_eq!(detected.pdf_type, PdfType::ImageBased);
    }

    #[test]
    fn test_dense_text_pdf_is_text_based() {
        let detector = TypeDetector::new(10);
        let body = "Cargo Ship Safety Construction Certificate IMO 9074729";
        let detected = detector.detect(&text_pdf(body), "application/pdf");
        assert_eq!(detected.kind, FileKind::Pdf);
        assert_eq!(detected.pdf_type, PdfType::TextBased);
        assert_eq!(detected.page_count, 1);

        // Detection is threshold-relative: the same document flips to
        // image-based under a stricter density requirement.
        let strict = TypeDetector::new(10_000);
        assert_eq!(
            strict.detect(&text_pdf(body), "application/pdf").pdf_type,
            PdfType::ImageBased
        );
    }

    #[test]
    fn test_pdf_without_text_layer_is_image_based() {
        let detector = TypeDetector::new(100);
        let detected = detector.detect(&image_only_pdf(), "application/pdf");
        assert_eq!(detected.kind, FileKind::Pdf);
        assert_eq!(detected.pdf_type, PdfType::ImageBased);
    }
}
