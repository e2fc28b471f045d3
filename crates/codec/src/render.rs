use crate::model::{AlertField, AlertRecord};

/// Renders one record as a block.
///
/// The opening brace carries no indentation (it is placed where the block
/// starts); fields are indented by `indent + unit` and the closing brace by
/// `indent`. Field order is fixed: modeled fields in declaration order, then
/// additional fields in source order. Absent optional fields are omitted.
pub(crate) fn render_block(record: &AlertRecord, indent: &str, unit: &str) -> String {
    let mut out = String::from("{\n");
    for field in AlertField::ALL {
        if let Some(value) = field_value(record, field) {
            push_line(&mut out, indent, unit, field.key(), &value);
        }
    }
    for (key, raw) in &record.additional_fields {
        push_line(&mut out, indent, unit, key, raw);
    }
    out.push_str(indent);
    out.push('}');
    out
}

/// Indentation-independent rendering used to detect mutation.
pub(crate) fn fingerprint(record: &AlertRecord) -> String {
    render_block(record, "", "  ")
}

fn push_line(out: &mut String, indent: &str, unit: &str, key: &str, value: &str) {
    out.push_str(indent);
    out.push_str(unit);
    if is_plain_key(key) {
        out.push_str(key);
    } else {
        out.push_str(&quote(key));
    }
    out.push_str(" = ");
    out.push_str(value);
    out.push('\n');
}

fn is_plain_key(key: &str) -> bool {
    key.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn field_value(record: &AlertRecord, field: AlertField) -> Option<String> {
    let text = |value: &Option<String>| value.as_deref().map(quote);
    let int = |value: Option<i64>| value.map(|v| v.to_string());
    let flag = |value: Option<bool>| value.map(|v| v.to_string());
    match field {
        AlertField::Name => text(&record.name),
        AlertField::Description => text(&record.description),
        AlertField::NrqlQuery => text(&record.nrql_query),
        AlertField::RunbookUrl => text(&record.runbook_url),
        AlertField::Severity => text(&record.severity),
        AlertField::Enabled => flag(record.enabled),
        AlertField::AggregationMethod => text(&record.aggregation_method),
        AlertField::AggregationWindow => int(record.aggregation_window),
        AlertField::AggregationDelay => int(record.aggregation_delay),
        AlertField::CriticalOperator => text(&record.critical_operator),
        AlertField::CriticalThreshold => record.critical_threshold.map(format_number),
        AlertField::CriticalThresholdDuration => int(record.critical_threshold_duration),
        AlertField::CriticalThresholdOccurrences => {
            text(&record.critical_threshold_occurrences)
        }
        AlertField::ExpirationDuration => int(record.expiration_duration),
        AlertField::CloseViolationsOnExpiration => flag(record.close_violations_on_expiration),
    }
}

/// Shortest decimal form that reads back to the same value: `12`, `3.5`, `0.25`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // normalizes -0
        return "0".to_string();
    }
    format!("{value}")
}

/// Quote a string for the document, escaping backslashes, quotes and
/// control characters.
///
/// A backslash that [`unquote`] kept as written (it starts no escape) is
/// emitted unchanged, so `quote(unquote(s))` reproduces `s`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for (at, ch) in value.char_indices() {
        match ch {
            '\\' => {
                let rest = &value[at + 1..];
                if rest.is_empty() || decode_escape(rest).is_some() {
                    out.push_str("\\\\");
                } else {
                    out.push('\\');
                }
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Inverse of [`quote`] for a full literal including its quotes.
/// `\uXXXX` and `\UXXXXXXXX` are decoded; unknown escapes are kept as written.
pub(crate) fn unquote(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut rest = inner;
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        match decode_escape(after) {
            Some((ch, used)) => {
                out.push(ch);
                rest = &after[used..];
            }
            None => {
                out.push('\\');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes the escape following a backslash. Returns the character and the
/// number of bytes consumed after the backslash.
fn decode_escape(rest: &str) -> Option<(char, usize)> {
    let simple = match rest.chars().next()? {
        '\\' => '\\',
        '"' => '"',
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'u' => return decode_hex(&rest[1..], 4),
        'U' => return decode_hex(&rest[1..], 8),
        _ => return None,
    };
    Some((simple, 1))
}

fn decode_hex(digits: &str, len: usize) -> Option<(char, usize)> {
    let hex = digits.get(..len)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let ch = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)?;
    Some((ch, len + 1))
}
