//! Maritime identity validation helpers.
//!
//! IMO normalization and check-digit validation, ship name normalization
//! for case-insensitive comparison, and issuing-authority abbreviation.

/// Strip everything but digits from a raw IMO value ("IMO 9876543" -> "9876543").
pub fn normalize_imo(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a 7-digit IMO number against its check digit.
///
/// The check digit is the last digit of the weighted sum of the first six
/// digits (weights 7 down to 2).
pub fn is_valid_imo(raw: &str) -> bool {
    let digits = normalize_imo(raw);
    if digits.len() != 7 {
        return false;
    }

    let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = values[..6]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (7 - i as u32))
        .sum();

    sum % 10 == values[6]
}

/// Collapse whitespace and casing for ship-name comparison.
///
/// Also drops common vessel prefixes ("MV", "M/V", "MT", "SS") which AI
/// extraction includes inconsistently.
pub fn normalize_ship_name(raw: &str) -> String {
    let collapsed: Vec<&str> = raw.split_whitespace().collect();
    let mut words = collapsed.as_slice();
    if let Some(first) = words.first() {
        let prefix = first.to_uppercase().replace('/', "");
        if matches!(prefix.as_str(), "MV" | "MT" | "MS" | "SS") {
            words = &words[1..];
        }
    }
    words.join(" ").to_lowercase()
}

/// Normalize an issuing-authority display name to its registry abbreviation.
///
/// Unrecognized issuers are passed through trimmed; the certificate keeps
/// whatever the document said.
pub fn issuer_abbreviation(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let abbrev = match () {
        _ if lower.contains("det norske veritas") || lower.contains("dnv") => "DNV",
        _ if lower.contains("lloyd") => "LR",
        _ if lower.contains("american bureau") || lower == "abs" => "ABS",
        _ if lower.contains("bureau veritas") || lower == "bv" => "BV",
        _ if lower.contains("nippon kaiji") || lower.contains("classnk") || lower == "nk" => "NK",
        _ if lower.contains("registro italiano") || lower.contains("rina") => "RINA",
        _ if lower.contains("korean register") || lower == "kr" => "KR",
        _ if lower.contains("china classification") || lower == "ccs" => "CCS",
        _ if lower.contains("russian maritime") || lower == "rs" => "RS",
        _ if lower.contains("indian register") || lower == "irs" => "IRS",
        _ => return raw.trim().to_string(),
    };
    abbrev.to_string()
}
