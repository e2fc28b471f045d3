use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced while reading or rewriting an alert section
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A block was opened but never closed, or a value could not be tokenized
    #[error("Malformed block at line {line}, column {column}: {message}")]
    MalformedBlock {
        line: usize,
        column: usize,
        message: String,
    },

    /// Rewrite requested for a document that has no alert section
    #[error("Section `{key}` not found in document")]
    SectionNotFound { key: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    /// Create a malformed-block error pointing at byte `offset` of `source`
    pub fn malformed(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self::MalformedBlock {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a section-not-found error
    pub fn section_not_found(key: impl Into<String>) -> Self {
        Self::SectionNotFound { key: key.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// 1-based line and column (in chars) of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
