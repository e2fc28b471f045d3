use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One alert definition read from (or destined for) the alert section.
///
/// Fields the codec does not model are kept in `additional_fields` as their
/// literal source text, so `tags = { team = "ops" }` is written back exactly
/// as it was read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub nrql_query: Option<String>,
    pub runbook_url: Option<String>,
    pub severity: Option<String>,
    pub enabled: Option<bool>,
    pub aggregation_method: Option<String>,
    pub aggregation_window: Option<i64>,
    pub aggregation_delay: Option<i64>,
    pub critical_operator: Option<String>,
    pub critical_threshold: Option<f64>,
    pub critical_threshold_duration: Option<i64>,
    pub critical_threshold_occurrences: Option<String>,
    pub expiration_duration: Option<i64>,
    pub close_violations_on_expiration: Option<bool>,

    /// Unmodeled keys in source order, values as raw source text
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub additional_fields: IndexMap<String, String>,

    #[serde(skip)]
    pub(crate) origin: Option<BlockOrigin>,
}

/// Verbatim text of a parsed block and the canonical rendering it had at
/// parse time. A record whose rendering still matches is written back as
/// `text`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockOrigin {
    pub text: String,
    pub fingerprint: String,
}

impl AlertRecord {
    /// Create a record with the two identifying fields set
    pub fn new(name: impl Into<String>, nrql_query: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            nrql_query: Some(nrql_query.into()),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn nrql_query(&self) -> &str {
        self.nrql_query.as_deref().unwrap_or_default()
    }

    /// True when the record came from a document and still carries its source text
    pub fn has_source_text(&self) -> bool {
        self.origin.is_some()
    }

    /// Forget the source text; the next rewrite renders this record canonically
    pub fn detach_source(&mut self) {
        self.origin = None;
    }
}

/// Equality covers alert content only; source snapshots are ignored.
impl PartialEq for AlertRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.nrql_query == other.nrql_query
            && self.runbook_url == other.runbook_url
            && self.severity == other.severity
            && self.enabled == other.enabled
            && self.aggregation_method == other.aggregation_method
            && self.aggregation_window == other.aggregation_window
            && self.aggregation_delay == other.aggregation_delay
            && self.critical_operator == other.critical_operator
            && self.critical_threshold == other.critical_threshold
            && self.critical_threshold_duration == other.critical_threshold_duration
            && self.critical_threshold_occurrences == other.critical_threshold_occurrences
            && self.expiration_duration == other.expiration_duration
            && self.close_violations_on_expiration == other.close_violations_on_expiration
            && self.additional_fields == other.additional_fields
    }
}

/// Value type of a modeled field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Integer,
    Float,
}

/// Modeled alert fields, in declaration order. This order is also the
/// canonical rendering order and the order validation reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertField {
    Name,
    Description,
    NrqlQuery,
    RunbookUrl,
    Severity,
    Enabled,
    AggregationMethod,
    AggregationWindow,
    AggregationDelay,
    CriticalOperator,
    CriticalThreshold,
    CriticalThresholdDuration,
    CriticalThresholdOccurrences,
    ExpirationDuration,
    CloseViolationsOnExpiration,
}

impl AlertField {
    pub const ALL: [AlertField; 15] = [
        Self::Name,
        Self::Description,
        Self::NrqlQuery,
        Self::RunbookUrl,
        Self::Severity,
        Self::Enabled,
        Self::AggregationMethod,
        Self::AggregationWindow,
        Self::AggregationDelay,
        Self::CriticalOperator,
        Self::CriticalThreshold,
        Self::CriticalThresholdDuration,
        Self::CriticalThresholdOccurrences,
        Self::ExpirationDuration,
        Self::CloseViolationsOnExpiration,
    ];

    /// Key used in the document
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::NrqlQuery => "nrql_query",
            Self::RunbookUrl => "runbook_url",
            Self::Severity => "severity",
            Self::Enabled => "enabled",
            Self::AggregationMethod => "aggregation_method",
            Self::AggregationWindow => "aggregation_window",
            Self::AggregationDelay => "aggregation_delay",
            Self::CriticalOperator => "critical_operator",
            Self::CriticalThreshold => "critical_threshold",
            Self::CriticalThresholdDuration => "critical_threshold_duration",
            Self::CriticalThresholdOccurrences => "critical_threshold_occurrences",
            Self::ExpirationDuration => "expiration_duration",
            Self::CloseViolationsOnExpiration => "close_violations_on_expiration",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Enabled | Self::CloseViolationsOnExpiration => FieldKind::Bool,
            Self::AggregationWindow
            | Self::AggregationDelay
            | Self::CriticalThresholdDuration
            | Self::ExpirationDuration => FieldKind::Integer,
            Self::CriticalThreshold => FieldKind::Float,
            _ => FieldKind::Text,
        }
    }
}

impl std::fmt::Display for AlertField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
