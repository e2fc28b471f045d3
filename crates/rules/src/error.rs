use thiserror::Error;

pub type Result<T> = std::result::Result<T, RulesError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RulesError {
    /// A required threshold parameter is missing or out of range
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Duration statistics that cannot produce a threshold (NaN, infinite)
    #[error("Invalid statistics: {0}")]
    InvalidStatistics(String),
}

impl RulesError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
