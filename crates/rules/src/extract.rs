//! Best-effort lexical extraction over human-authored alert titles.
//!
//! Titles follow loose conventions such as `Shipment duration <DPD>(741)` or
//! the older `Duration Carrier: DPD (741)`. Nothing here fails: a title that
//! does not follow a convention yields an empty string.

/// Marker preceding the carrier label in older titles.
pub const LEGACY_LABEL_MARKER: &str = "Carrier:";

/// Label written as `<label>(id)`. The first `<...>` directly followed by a
/// non-empty parenthesized group wins.
pub fn carrier_label(name: &str) -> String {
    let mut search_from = 0;
    while let Some(rel_open) = name[search_from..].find('<') {
        let open = search_from + rel_open;
        let Some(rel_close) = name[open + 1..].find('>') else {
            break;
        };
        let close = open + 1 + rel_close;
        if let Some(id) = parenthesized_after(name, close + 1) {
            let label = name[open + 1..close].trim();
            if !label.is_empty() && !id.trim().is_empty() {
                return label.to_string();
            }
        }
        search_from = open + 1;
    }
    String::new()
}

/// Label written as `Carrier: label (id)`; marker matched case-insensitively.
pub fn legacy_carrier_label(name: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `name`
    let lowered = name.to_ascii_lowercase();
    let marker = LEGACY_LABEL_MARKER.to_ascii_lowercase();
    let Some(at) = lowered.find(&marker) else {
        return String::new();
    };
    let rest = &name[at + marker.len()..];
    let Some(paren) = rest.find('(') else {
        return String::new();
    };
    if !rest[paren..].contains(')') {
        return String::new();
    }
    rest[..paren].trim().to_string()
}

/// Trailing `(digits)` of a title. Anything other than ASCII digits inside
/// the parentheses means there is no identifier.
pub fn carrier_id(name: &str) -> String {
    let trimmed = name.trim_end();
    let Some(body) = trimmed.strip_suffix(')') else {
        return String::new();
    };
    let Some(open) = body.rfind('(') else {
        return String::new();
    };
    let digits = &body[open + 1..];
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.to_string()
    } else {
        String::new()
    }
}

/// Bracketed label, falling back to the legacy form.
pub fn display_label(name: &str) -> String {
    let label = carrier_label(name);
    if label.is_empty() {
        legacy_carrier_label(name)
    } else {
        label
    }
}

fn parenthesized_after(name: &str, at: usize) -> Option<&str> {
    let rest = name.get(at..)?.strip_prefix('(')?;
    let close = rest.find(')')?;
    Some(&rest[..close])
}
