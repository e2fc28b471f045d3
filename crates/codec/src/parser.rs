//! Section locator and block reader.
//!
//! Works over the token stream from [`crate::lexer`]. The only construct
//! understood is `<key> = [ { field = value ... }, ... ]`; nested maps and
//! lists inside a value are skipped by depth counting and kept as raw text.

use crate::lexer::{tokenize, Token, TokenKind};
use crate::model::{AlertField, AlertRecord, BlockOrigin, FieldKind};
use crate::render::{fingerprint, unquote};
use crate::{CodecError, Result};
use std::collections::HashSet;

/// Byte layout of the alert section in a document.
#[derive(Debug, Clone)]
pub(crate) struct Section {
    /// Offset of the section key
    pub key_start: usize,
    /// Offset just past `[`
    pub content_start: usize,
    /// Offset of `]`
    pub content_end: usize,
    pub blocks: Vec<ParsedBlock>,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedBlock {
    pub start: usize,
    pub end: usize,
    pub record: AlertRecord,
}

#[derive(Debug, Clone, PartialEq)]
enum ValueKind {
    Str(String),
    Number,
    Bool(bool),
    Map,
    List,
}

#[derive(Debug, Clone)]
struct Value {
    kind: ValueKind,
    start: usize,
    end: usize,
}

struct Cursor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    idx: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.idx).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.idx += 1;
        Some(token)
    }

    fn skip_while(&mut self, kinds: &[TokenKind]) {
        while self.peek().is_some_and(|t| kinds.contains(&t.kind)) {
            self.idx += 1;
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> CodecError {
        CodecError::malformed(self.source, offset, message)
    }
}

/// Finds and reads the alert section. `Ok(None)` when the document has none.
pub(crate) fn scan_section(source: &str, key: &str) -> Result<Option<Section>> {
    let tokens = tokenize(source)?;
    let Some((key_idx, open_idx)) = locate(source, &tokens, key) else {
        log::debug!("no `{key}` section in document");
        return Ok(None);
    };

    let open = tokens[open_idx];
    let mut cursor = Cursor {
        source,
        tokens: &tokens,
        idx: open_idx + 1,
    };
    let mut blocks = Vec::new();
    let content_end = loop {
        cursor.skip_while(&[TokenKind::Newline, TokenKind::Comma]);
        let Some(token) = cursor.peek() else {
            return Err(cursor.error(open.start, format!("section `{key}` is never closed")));
        };
        match token.kind {
            TokenKind::RBracket => break token.start,
            TokenKind::LBrace => blocks.push(read_block(&mut cursor)?),
            _ => {
                return Err(cursor.error(
                    token.start,
                    format!("expected an alert block, found `{}`", token.text(source)),
                ))
            }
        }
    };

    log::debug!("section `{key}` holds {} blocks", blocks.len());
    Ok(Some(Section {
        key_start: tokens[key_idx].start,
        content_start: open.end,
        content_end,
        blocks,
    }))
}

/// Token indices of the section key and its opening bracket.
fn locate(source: &str, tokens: &[Token], key: &str) -> Option<(usize, usize)> {
    for (idx, token) in tokens.iter().enumerate() {
        let matches_key = match token.kind {
            TokenKind::Ident => token.text(source) == key,
            TokenKind::Str => unquote(token.text(source)) == key,
            _ => false,
        };
        if !matches_key {
            continue;
        }
        let in_key_position = idx == 0
            || matches!(
                tokens[idx - 1].kind,
                TokenKind::Newline | TokenKind::LBrace | TokenKind::Comma
            );
        if !in_key_position {
            continue;
        }
        let Some(sep) = tokens.get(idx + 1) else {
            continue;
        };
        if !matches!(sep.kind, TokenKind::Assign | TokenKind::Colon) {
            continue;
        }
        let mut open_idx = idx + 2;
        while tokens
            .get(open_idx)
            .is_some_and(|t| t.kind == TokenKind::Newline)
        {
            open_idx += 1;
        }
        if tokens
            .get(open_idx)
            .is_some_and(|t| t.kind == TokenKind::LBracket)
        {
            return Some((idx, open_idx));
        }
        log::debug!(
            "`{key}` at byte {} is not a list literal; skipping",
            token.start
        );
    }
    None
}

fn read_block(cursor: &mut Cursor<'_>) -> Result<ParsedBlock> {
    let source = cursor.source;
    let Some(open) = cursor.bump() else {
        return Err(cursor.error(source.len(), "expected an alert block"));
    };

    let mut record = AlertRecord::default();
    let mut seen: HashSet<String> = HashSet::new();
    let end = loop {
        cursor.skip_while(&[TokenKind::Newline, TokenKind::Comma]);
        let Some(token) = cursor.bump() else {
            return Err(never_closed(cursor, open));
        };
        let key = match token.kind {
            TokenKind::RBrace => break token.end,
            TokenKind::Ident => token.text(source).to_string(),
            TokenKind::Str => unquote(token.text(source)),
            _ => {
                return Err(cursor.error(
                    token.start,
                    format!("expected a field name, found `{}`", token.text(source)),
                ))
            }
        };

        match cursor.bump() {
            Some(sep) if matches!(sep.kind, TokenKind::Assign | TokenKind::Colon) => {}
            Some(other) => {
                return Err(cursor.error(other.start, format!("expected `=` after `{key}`")))
            }
            None => return Err(never_closed(cursor, open)),
        }

        let value = read_value(cursor, &key)?;
        match cursor.peek() {
            Some(next)
                if matches!(
                    next.kind,
                    TokenKind::Newline | TokenKind::Comma | TokenKind::RBrace
                ) => {}
            Some(next) => {
                return Err(cursor.error(
                    next.start,
                    format!(
                        "unexpected `{}` after the value of `{key}`",
                        next.text(source)
                    ),
                ))
            }
            None => return Err(never_closed(cursor, open)),
        }

        if !seen.insert(key.clone()) {
            return Err(cursor.error(token.start, format!("duplicate field `{key}`")));
        }
        assign(cursor, &mut record, key, value)?;
    };

    let text = source[open.start..end].to_string();
    record.origin = Some(BlockOrigin {
        text,
        fingerprint: fingerprint(&record),
    });

    Ok(ParsedBlock {
        start: open.start,
        end,
        record,
    })
}

fn never_closed(cursor: &Cursor<'_>, open: Token) -> CodecError {
    cursor.error(open.start, "alert block is never closed")
}

fn read_value(cursor: &mut Cursor<'_>, key: &str) -> Result<Value> {
    let source = cursor.source;
    let Some(token) = cursor.bump() else {
        return Err(cursor.error(source.len(), format!("missing value for `{key}`")));
    };
    let single = |kind| Value {
        kind,
        start: token.start,
        end: token.end,
    };
    match token.kind {
        TokenKind::Str => Ok(single(ValueKind::Str(unquote(token.text(source))))),
        TokenKind::Number => Ok(single(ValueKind::Number)),
        TokenKind::Ident if token.text(source) == "true" => Ok(single(ValueKind::Bool(true))),
        TokenKind::Ident if token.text(source) == "false" => Ok(single(ValueKind::Bool(false))),
        TokenKind::LBrace | TokenKind::LBracket => {
            let mut depth = 1usize;
            let end = loop {
                let Some(inner) = cursor.bump() else {
                    return Err(cursor.error(
                        token.start,
                        format!("value of `{key}` is never closed"),
                    ));
                };
                match inner.kind {
                    TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                    TokenKind::RBrace | TokenKind::RBracket => {
                        depth -= 1;
                        if depth == 0 {
                            break inner.end;
                        }
                    }
                    _ => {}
                }
            };
            let kind = if token.kind == TokenKind::LBrace {
                ValueKind::Map
            } else {
                ValueKind::List
            };
            Ok(Value {
                kind,
                start: token.start,
                end,
            })
        }
        _ => Err(cursor.error(
            token.start,
            format!(
                "value of `{key}` must be a quoted string, number, boolean or map, found `{}`",
                token.text(source)
            ),
        )),
    }
}

fn assign(cursor: &Cursor<'_>, record: &mut AlertRecord, key: String, value: Value) -> Result<()> {
    let raw = &cursor.source[value.start..value.end];
    let Some(field) = AlertField::from_key(&key) else {
        record.additional_fields.insert(key, raw.to_string());
        return Ok(());
    };

    let mismatch = |expected: &str| {
        cursor.error(
            value.start,
            format!("`{key}` expects {expected}, found `{raw}`"),
        )
    };

    match (field.kind(), &value.kind) {
        (FieldKind::Text, ValueKind::Str(text)) => {
            let slot = match field {
                AlertField::Name => &mut record.name,
                AlertField::Description => &mut record.description,
                AlertField::NrqlQuery => &mut record.nrql_query,
                AlertField::RunbookUrl => &mut record.runbook_url,
                AlertField::Severity => &mut record.severity,
                AlertField::AggregationMethod => &mut record.aggregation_method,
                AlertField::CriticalOperator => &mut record.critical_operator,
                _ => &mut record.critical_threshold_occurrences,
            };
            *slot = Some(text.clone());
        }
        (FieldKind::Bool, ValueKind::Bool(flag)) => {
            if field == AlertField::Enabled {
                record.enabled = Some(*flag);
            } else {
                record.close_violations_on_expiration = Some(*flag);
            }
        }
        (FieldKind::Integer, ValueKind::Number) => {
            let number = raw.parse::<i64>().map_err(|_| mismatch("an integer"))?;
            let slot = match field {
                AlertField::AggregationWindow => &mut record.aggregation_window,
                AlertField::AggregationDelay => &mut record.aggregation_delay,
                AlertField::CriticalThresholdDuration => &mut record.critical_threshold_duration,
                _ => &mut record.expiration_duration,
            };
            *slot = Some(number);
        }
        (FieldKind::Float, ValueKind::Number) => {
            let number = raw.parse::<f64>().map_err(|_| mismatch("a number"))?;
            record.critical_threshold = Some(number);
        }
        (FieldKind::Text, _) => return Err(mismatch("a quoted string")),
        (FieldKind::Bool, _) => return Err(mismatch("`true` or `false`")),
        (FieldKind::Integer, _) => return Err(mismatch("an integer")),
        (FieldKind::Float, _) => return Err(mismatch("a number")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"# carrier alerts
module "alerts" {
  source = "./modules/alerts"
  alerts = [
    {
      name       = "Shipment duration <DPD>(741)"
      nrql_query = "SELECT average(duration) FROM Tx WHERE carrierId = 741"
      enabled    = true
      critical_threshold = 12.5
      aggregation_window = 60
      tags       = { team = "ops", nested = { a = [1, 2] } }  // kept
    },
  ]
}
"#;

    #[test]
    fn reads_fields_and_keeps_unknown_raw() {
        let section = scan_section(DOC, "alerts").unwrap().expect("section");
        assert_eq!(section.blocks.len(), 1);
        let record = &section.blocks[0].record;
        assert_eq!(record.name(), "Shipment duration <DPD>(741)");
        assert_eq!(record.enabled, Some(true));
        assert_eq!(record.critical_threshold, Some(12.5));
        assert_eq!(record.aggregation_window, Some(60));
        assert_eq!(
            record.additional_fields.get("tags").map(String::as_str),
            Some(r#"{ team = "ops", nested = { a = [1, 2] } }"#)
        );
        assert_eq!(&DOC[section.content_end..section.content_end + 1], "]");
        assert!(DOC[section.blocks[0].start..section.blocks[0].end].starts_with('{'));
        assert!(DOC[section.blocks[0].start..section.blocks[0].end].ends_with('}'));
    }

    #[test]
    fn absent_section_is_none() {
        assert!(scan_section("x = 1\n", "alerts").unwrap().is_none());
        // value position, not a key
        assert!(scan_section("other = alerts\n", "alerts").unwrap().is_none());
    }

    #[test]
    fn unclosed_block_is_malformed() {
        let doc = "alerts = [\n  {\n    name = \"abcdefghijk\"\n";
        let err = scan_section(doc, "alerts").unwrap_err();
        match err {
            CodecError::MalformedBlock { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("never closed"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reference_values_are_rejected() {
        let doc = "alerts = [\n  {\n    runbook_url = var.runbook\n  }\n]\n";
        let err = scan_section(doc, "alerts").unwrap_err();
        assert!(matches!(err, CodecError::MalformedBlock { line: 3, .. }));
    }

    #[test]
    fn wrong_type_for_known_field_is_rejected() {
        let doc = "alerts = [{ aggregation_window = \"60\" }]";
        assert!(scan_section(doc, "alerts").is_err());
        let doc = "alerts = [{ aggregation_window = 1.5 }]";
        assert!(scan_section(doc, "alerts").is_err());
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let doc = "alerts = [{\n severity = \"a\"\n severity = \"b\"\n}]";
        assert!(scan_section(doc, "alerts").is_err());
    }

    #[test]
    fn quoted_keys_and_colon_separators() {
        let doc = "\"alerts\": [{ \"name\": \"Quoted key alert\", \"x-y\": 2 }]";
        let section = scan_section(doc, "alerts").unwrap().expect("section");
        let record = &section.blocks[0].record;
        assert_eq!(record.name(), "Quoted key alert");
        assert_eq!(
            record.additional_fields.get("x-y").map(String::as_str),
            Some("2")
        );
    }
}
