use std::collections::HashMap;
use std::fmt;

use alertsmith_codec::{AlertField, AlertRecord};
use serde::Serialize;

/// Minimum length of a title or query.
pub const MIN_TEXT_LEN: usize = 10;

const FORBIDDEN: &[char] = &['[', ']', '{', '}'];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Missing,
    TooShort { min: usize, actual: usize },
    ForbiddenCharacter { character: char },
    Negative { value: f64 },
    NotFinite,
    Duplicate { first_index: usize },
}

/// One failed check on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: AlertField,
    #[serde(flatten)]
    pub violation: Violation,
}

impl ValidationError {
    fn new(field: AlertField, violation: Violation) -> Self {
        Self { field, violation }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field;
        match &self.violation {
            Violation::Missing => write!(f, "{field} is required"),
            Violation::TooShort { min, actual } => {
                write!(f, "{field} must be at least {min} characters (got {actual})")
            }
            Violation::ForbiddenCharacter { character } => {
                write!(f, "{field} must not contain '{character}'")
            }
            Violation::Negative { value } => write!(f, "{field} must not be negative (got {value})"),
            Violation::NotFinite => write!(f, "{field} must be a finite number"),
            Violation::Duplicate { first_index } => {
                write!(f, "duplicate of alert #{first_index} (same name and query)")
            }
        }
    }
}

/// Violation tied to the position of the offending record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetViolation {
    pub index: usize,
    #[serde(flatten)]
    pub error: ValidationError,
}

/// Every violation of `record`, in field declaration order. An empty list
/// means the record is valid.
pub fn validate_record(record: &AlertRecord) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for field in AlertField::ALL {
        check_field(record, field, &mut errors);
    }
    errors
}

/// Validate each record and, with `check_duplicates`, flag records repeating
/// an earlier (name, query) pair.
pub fn validate_set(records: &[AlertRecord], check_duplicates: bool) -> Vec<SetViolation> {
    let mut out = Vec::new();
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        out.extend(
            validate_record(record)
                .into_iter()
                .map(|error| SetViolation { index, error }),
        );
        if !check_duplicates {
            continue;
        }
        let key = (record.name(), record.nrql_query());
        match seen.get(&key) {
            Some(&first_index) => out.push(SetViolation {
                index,
                error: ValidationError::new(AlertField::Name, Violation::Duplicate { first_index }),
            }),
            None => {
                seen.insert(key, index);
            }
        }
    }
    log::debug!(
        "validated {} alerts: {} violations",
        records.len(),
        out.len()
    );
    out
}

fn check_field(record: &AlertRecord, field: AlertField, errors: &mut Vec<ValidationError>) {
    match field {
        AlertField::Name => check_text(field, record.name.as_deref(), true, errors),
        AlertField::NrqlQuery => check_text(field, record.nrql_query.as_deref(), true, errors),
        AlertField::Severity => check_text(field, record.severity.as_deref(), false, errors),
        AlertField::AggregationMethod => {
            check_text(field, record.aggregation_method.as_deref(), false, errors)
        }
        AlertField::CriticalOperator => {
            check_text(field, record.critical_operator.as_deref(), false, errors)
        }
        AlertField::CriticalThresholdOccurrences => check_text(
            field,
            record.critical_threshold_occurrences.as_deref(),
            false,
            errors,
        ),
        AlertField::AggregationDelay => {
            check_non_negative(field, record.aggregation_delay.map(|v| v as f64), errors)
        }
        AlertField::CriticalThresholdDuration => check_non_negative(
            field,
            record.critical_threshold_duration.map(|v| v as f64),
            errors,
        ),
        AlertField::CriticalThreshold => match record.critical_threshold {
            Some(value) if !value.is_finite() => {
                errors.push(ValidationError::new(field, Violation::NotFinite))
            }
            other => check_non_negative(field, other, errors),
        },
        _ => {}
    }
}

fn check_text(
    field: AlertField,
    value: Option<&str>,
    min_len: bool,
    errors: &mut Vec<ValidationError>,
) {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        errors.push(ValidationError::new(field, Violation::Missing));
        return;
    };
    let actual = value.chars().count();
    if min_len && actual < MIN_TEXT_LEN {
        errors.push(ValidationError::new(
            field,
            Violation::TooShort {
                min: MIN_TEXT_LEN,
                actual,
            },
        ));
    }
    if let Some(character) = value.chars().find(|c| FORBIDDEN.contains(c)) {
        errors.push(ValidationError::new(
            field,
            Violation::ForbiddenCharacter { character },
        ));
    }
}

fn check_non_negative(field: AlertField, value: Option<f64>, errors: &mut Vec<ValidationError>) {
    if let Some(value) = value.filter(|v| *v < 0.0) {
        errors.push(ValidationError::new(field, Violation::Negative { value }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid() -> AlertRecord {
        let mut record = AlertRecord::new(
            "Shipment duration <DPD>(741)",
            "SELECT average(duration) FROM Tx WHERE carrierId = 741",
        );
        record.severity = Some("critical".to_string());
        record.aggregation_method = Some("event_flow".to_string());
        record.critical_operator = Some("above".to_string());
        record.critical_threshold_occurrences = Some("all".to_string());
        record.critical_threshold = Some(12.0);
        record
    }

    #[test]
    fn complete_record_passes() {
        assert!(validate_record(&valid()).is_empty());
    }

    #[test]
    fn all_violations_are_reported_in_field_order() {
        let mut record = valid();
        record.name = None;
        record.severity = Some("crit[ical".to_string());

        let errors = validate_record(&record);
        assert_eq!(
            errors,
            vec![
                ValidationError::new(AlertField::Name, Violation::Missing),
                ValidationError::new(
                    AlertField::Severity,
                    Violation::ForbiddenCharacter { character: '[' }
                ),
            ]
        );
    }

    #[test]
    fn short_text_and_braces_both_reported() {
        let mut record = valid();
        record.nrql_query = Some("SELECT {".to_string());
        let fields: Vec<Violation> = validate_record(&record)
            .into_iter()
            .map(|e| e.violation)
            .collect();
        assert_eq!(
            fields,
            vec![
                Violation::TooShort { min: 10, actual: 8 },
                Violation::ForbiddenCharacter { character: '{' },
            ]
        );
    }

    #[test]
    fn numeric_bounds() {
        let mut record = valid();
        record.aggregation_delay = Some(-1);
        record.critical_threshold = Some(f64::NAN);
        record.critical_threshold_duration = Some(-60);
        let fields: Vec<AlertField> = validate_record(&record)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                AlertField::AggregationDelay,
                AlertField::CriticalThreshold,
                AlertField::CriticalThresholdDuration,
            ]
        );
    }

    #[test]
    fn duplicates_are_tagged_with_index() {
        let records = vec![valid(), valid(), valid()];
        let found = validate_set(&records, true);
        let indexes: Vec<(usize, Violation)> = found
            .into_iter()
            .map(|v| (v.index, v.error.violation))
            .collect();
        assert_eq!(
            indexes,
            vec![
                (1, Violation::Duplicate { first_index: 0 }),
                (2, Violation::Duplicate { first_index: 0 }),
            ]
        );
        assert!(validate_set(&records, false).is_empty());
    }

    #[test]
    fn messages_name_the_field() {
        let error = ValidationError::new(AlertField::NrqlQuery, Violation::Missing);
        assert_eq!(error.to_string(), "nrql_query is required");
    }
}
