use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Root {root} is missing required folders: {}", missing.join(", "))]
    MissingFolders { root: String, missing: Vec<String> },

    #[error("Root {0} is not a directory")]
    NotADirectory(String),

    #[error("Setting {key} rejected: {reason}")]
    RejectedSetting { key: String, reason: String },
}
