//! Interfaces the alertsmith core consumes but does not own.
//!
//! The host application provides a key-value settings store and a way to
//! look at directories. Both are plain traits so the core stays testable
//! without a real UI or settings backend.

mod error;
pub mod layout;
pub mod settings;

pub use error::{ProtocolError, Result};
pub use layout::{check_root_layout, normalize_folder_name, DirectoryProbe, FsDirectoryProbe};
pub use settings::{MemorySettings, SettingsStore};
