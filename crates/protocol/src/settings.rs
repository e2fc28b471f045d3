use crate::{ProtocolError, Result};
use std::collections::BTreeMap;

/// Path of the document holding the alert section.
pub const KEY_DOCUMENT_PATH: &str = "document.path";
/// Attribute name of the alert list inside the document.
pub const KEY_SECTION_KEY: &str = "document.section_key";
/// Repository root configured by the user.
pub const KEY_REPO_ROOT: &str = "repo.root";

/// Key-value settings provided by the host application.
pub trait SettingsStore {
    fn get_setting(&self, key: &str) -> Option<String>;

    fn set_setting(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store. Nothing is persisted; callers seed it from whatever
/// configuration source they own.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for MemorySettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ProtocolError::RejectedSetting {
                key: key.to_string(),
                reason: "empty key".to_string(),
            });
        }
        log::debug!("setting {key} = {value}");
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
