use crate::config::{CodecConfig, ReplaceMode};
use crate::model::AlertRecord;
use crate::parser::{scan_section, Section};
use crate::render::{fingerprint, render_block};
use crate::{CodecError, Result};

/// Reads the alert section out of a document and writes an updated list back
/// into the same place, leaving every other byte untouched.
#[derive(Debug, Clone, Default)]
pub struct AlertCodec {
    config: CodecConfig,
}

impl AlertCodec {
    /// Create a codec; fails when the configuration does not validate
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate().map_err(CodecError::invalid_config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// All alert records of `document`, in source order.
    ///
    /// A document without the section yields an empty list.
    pub fn parse(&self, document: &str) -> Result<Vec<AlertRecord>> {
        let section = scan_section(document, &self.config.section_key)?;
        Ok(section
            .map(|section| section.blocks.into_iter().map(|b| b.record).collect())
            .unwrap_or_default())
    }

    /// True when `document` has an alert section (possibly empty)
    pub fn has_section(&self, document: &str) -> Result<bool> {
        Ok(scan_section(document, &self.config.section_key)?.is_some())
    }

    /// Rewrites the alert section of `document` to hold exactly `alerts`.
    ///
    /// Records that still match what was parsed are emitted with their
    /// original text; everything else is rendered canonically. Separators
    /// between blocks are reused from the source by position.
    pub fn replace(
        &self,
        document: &str,
        alerts: &[AlertRecord],
        mode: ReplaceMode,
    ) -> Result<String> {
        match scan_section(document, &self.config.section_key)? {
            Some(section) => Ok(self.splice(document, &section, alerts)),
            None if mode == ReplaceMode::CreateIfMissing => Ok(self.append(document, alerts)),
            None => Err(CodecError::section_not_found(&self.config.section_key)),
        }
    }

    /// Re-renders every block of the section in canonical form.
    pub fn canonicalize(&self, document: &str) -> Result<String> {
        let Some(section) = scan_section(document, &self.config.section_key)? else {
            return Ok(document.to_string());
        };
        let alerts: Vec<AlertRecord> = section
            .blocks
            .iter()
            .map(|block| {
                let mut record = block.record.clone();
                record.detach_source();
                record
            })
            .collect();
        Ok(self.splice(document, &section, &alerts))
    }

    fn splice(&self, document: &str, section: &Section, alerts: &[AlertRecord]) -> String {
        let unit = self.config.indent_unit.as_str();
        let block_indent = match section.blocks.first() {
            Some(first) => line_indent(document, first.start).to_string(),
            None => format!("{}{unit}", line_indent(document, section.key_start)),
        };

        // gaps[i] is the text before block i (after block i-1)
        let mut gaps: Vec<&str> = Vec::with_capacity(section.blocks.len());
        let mut cursor = section.content_start;
        for block in &section.blocks {
            gaps.push(&document[cursor..block.start]);
            cursor = block.end;
        }
        let tail = &document[cursor..section.content_end];

        let fresh_first = format!("\n{block_indent}");
        let fresh_next = match gaps.len() {
            0 | 1 => format!(",\n{block_indent}"),
            n => separator_shape(gaps[n - 1], &block_indent),
        };

        let mut out = String::with_capacity(document.len());
        out.push_str(&document[..section.content_start]);
        for (idx, record) in alerts.iter().enumerate() {
            let sep = match gaps.get(idx) {
                Some(gap) => *gap,
                None if idx == 0 => fresh_first.as_str(),
                None => fresh_next.as_str(),
            };
            out.push_str(sep);
            out.push_str(&self.render_record(record, &block_indent));
        }

        if section.blocks.is_empty() && !alerts.is_empty() && tail.trim().is_empty() {
            out.push_str(",\n");
            out.push_str(line_indent(document, section.key_start));
        } else if alerts.is_empty() && !section.blocks.is_empty() {
            out.push_str(tail.trim_start_matches(','));
        } else {
            out.push_str(tail);
        }
        out.push_str(&document[section.content_end..]);

        log::debug!(
            "rewrote section `{}`: {} blocks -> {} blocks",
            self.config.section_key,
            section.blocks.len(),
            alerts.len()
        );
        out
    }

    fn append(&self, document: &str, alerts: &[AlertRecord]) -> String {
        let unit = self.config.indent_unit.as_str();
        let mut out = document.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.config.section_key);
        out.push_str(" = [");
        for record in alerts {
            out.push('\n');
            out.push_str(unit);
            out.push_str(&self.render_record(record, unit));
            out.push(',');
        }
        if !alerts.is_empty() {
            out.push('\n');
        }
        out.push_str("]\n");
        log::debug!(
            "created section `{}` with {} blocks",
            self.config.section_key,
            alerts.len()
        );
        out
    }

    fn render_record(&self, record: &AlertRecord, indent: &str) -> String {
        if let Some(origin) = &record.origin {
            if origin.fingerprint == fingerprint(record) {
                return origin.text.clone();
            }
        }
        render_block(record, indent, &self.config.indent_unit)
    }
}

/// Comma and line layout of an inter-block gap, without its comments.
fn separator_shape(gap: &str, block_indent: &str) -> String {
    let lines: Vec<&str> = gap.split('\n').collect();
    if lines.len() < 2 {
        return ", ".to_string();
    }
    let blank_line = lines[1..lines.len() - 1]
        .iter()
        .any(|line| line.trim().is_empty());
    if blank_line {
        format!(",\n\n{block_indent}")
    } else {
        format!(",\n{block_indent}")
    }
}

/// Leading whitespace of the line containing `offset`.
fn line_indent(document: &str, offset: usize) -> &str {
    let line_start = document[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let line = &document[line_start..offset];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Parse with the default configuration.
pub fn parse_alerts(document: &str) -> Result<Vec<AlertRecord>> {
    AlertCodec::default().parse(document)
}

/// Replace with the default configuration; the section must already exist.
pub fn replace_alerts(document: &str, alerts: &[AlertRecord]) -> Result<String> {
    AlertCodec::default().replace(document, alerts, ReplaceMode::ExistingOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "locals {\n  alerts = [\n    {\n      name = \"Shipment duration <DPD>(741)\"\n      severity = \"critical\" # page\n    },\n    {\n      name = \"Error rate <GLS>(12)\"\n    },\n  ]\n}\n";

    #[test]
    fn line_indent_reads_leading_whitespace() {
        let offset = DOC.find("alerts").unwrap();
        assert_eq!(line_indent(DOC, offset), "  ");
        assert_eq!(line_indent("\tkey", 1), "\t");
        assert_eq!(line_indent("key", 0), "");
    }

    #[test]
    fn untouched_records_round_trip_exactly() {
        let codec = AlertCodec::default();
        let alerts = codec.parse(DOC).unwrap();
        let out = codec
            .replace(DOC, &alerts, ReplaceMode::ExistingOnly)
            .unwrap();
        assert_eq!(out, DOC);
    }

    #[test]
    fn mutated_record_is_rendered_at_block_indent() {
        let codec = AlertCodec::default();
        let mut alerts = codec.parse(DOC).unwrap();
        alerts[1].critical_threshold = Some(4.5);
        let out = codec
            .replace(DOC, &alerts, ReplaceMode::ExistingOnly)
            .unwrap();
        let expected = DOC.replace(
            "{\n      name = \"Error rate <GLS>(12)\"\n    }",
            "{\n      name = \"Error rate <GLS>(12)\"\n      critical_threshold = 4.5\n    }",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn separator_shape_drops_comments() {
        assert_eq!(separator_shape(",\n\n    // GLS\n    ", "    "), ",\n\n    ");
        assert_eq!(separator_shape(",\n    # next\n    ", "    "), ",\n    ");
        assert_eq!(separator_shape(", /* x */ ", "    "), ", ");
    }

    #[test]
    fn appended_record_follows_last_separator_layout() {
        let codec = AlertCodec::default();
        let mut alerts = codec.parse(DOC).unwrap();
        alerts.push(AlertRecord::new("Duration <UPS>(99)", "SELECT 1 FROM Tx"));
        let out = codec
            .replace(DOC, &alerts, ReplaceMode::ExistingOnly)
            .unwrap();
        assert!(
            out.contains("    },\n    {\n      name = \"Duration <UPS>(99)\"\n      nrql_query = \"SELECT 1 FROM Tx\"\n    },\n  ]\n}\n"),
            "{out}"
        );
        assert_eq!(codec.parse(&out).unwrap().len(), 3);
    }

    #[test]
    fn removing_all_records_leaves_empty_list() {
        let codec = AlertCodec::default();
        let out = codec.replace(DOC, &[], ReplaceMode::ExistingOnly).unwrap();
        assert_eq!(out, "locals {\n  alerts = [\n  ]\n}\n");
        assert!(codec.parse(&out).unwrap().is_empty());
    }

    #[test]
    fn filling_an_empty_list() {
        let codec = AlertCodec::default();
        let doc = "locals {\n  alerts = []\n}\n";
        let out = codec
            .replace(
                doc,
                &[AlertRecord::new("Fresh alert name", "SELECT count(*) FROM Tx")],
                ReplaceMode::ExistingOnly,
            )
            .unwrap();
        assert_eq!(
            out,
            "locals {\n  alerts = [\n    {\n      name = \"Fresh alert name\"\n      nrql_query = \"SELECT count(*) FROM Tx\"\n    },\n  ]\n}\n"
        );
    }

    #[test]
    fn missing_section_errors_unless_creation_requested() {
        let codec = AlertCodec::default();
        let doc = "provider \"newrelic\" {}\n";
        let record = AlertRecord::new("Created alert name", "SELECT 1 FROM Tx");

        let err = codec
            .replace(doc, &[record.clone()], ReplaceMode::ExistingOnly)
            .unwrap_err();
        assert_eq!(err, CodecError::section_not_found("alerts"));

        let out = codec
            .replace(doc, &[record.clone()], ReplaceMode::CreateIfMissing)
            .unwrap();
        assert!(out.starts_with(doc));
        assert_eq!(codec.parse(&out).unwrap(), vec![record]);
    }

    #[test]
    fn canonicalize_rewrites_layout_but_keeps_values() {
        let codec = AlertCodec::default();
        let doc = "alerts = [ { severity = \"warning\", name = \"Compact block name\" } ]\n";
        let out = codec.canonicalize(doc).unwrap();
        assert_eq!(
            out,
            "alerts = [ {\n  name = \"Compact block name\"\n  severity = \"warning\"\n} ]\n"
        );
        assert_eq!(codec.parse(&out).unwrap(), codec.parse(doc).unwrap());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = AlertCodec::new(CodecConfig::for_section("")).unwrap_err();
        assert!(matches!(err, CodecError::InvalidConfig(_)));
    }
}
