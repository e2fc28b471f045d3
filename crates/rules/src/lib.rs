//! # Alertsmith Rules
//!
//! Pure functions over parsed alert records:
//!
//! - carrier matching with exact boundaries ([`name_match`], [`id_match`],
//!   [`has_alert_of_kind`])
//! - best-effort carrier/ID extraction from alert titles
//! - field validation that reports every violation at once
//! - threshold suggestions from duration statistics
//!
//! Nothing here touches the filesystem or holds state; every function is safe
//! to call from any thread on independent inputs.

mod config;
mod error;
mod extract;
mod matcher;
mod threshold;
mod validation;

pub use config::{ThresholdConfig, THRESHOLD_KEYS};
pub use error::{Result, RulesError};
pub use extract::{carrier_id, carrier_label, display_label, legacy_carrier_label, LEGACY_LABEL_MARKER};
pub use matcher::{
    alerts_for_carrier, has_alert_of_kind, id_match, matches_key, name_match, AlertKind,
    CarrierKey, VARIANT_MARKER,
};
pub use threshold::{
    round_to_half, suggest_threshold, DurationStatistics, ThresholdMethod, ThresholdParams,
    ABSOLUTE_FLOOR, DEFAULT_FORMULA_MULTIPLIER, DEFAULT_FORMULA_OFFSET,
};
pub use validation::{
    validate_record, validate_set, SetViolation, ValidationError, Violation, MIN_TEXT_LEN,
};
