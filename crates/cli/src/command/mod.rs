use alertsmith_codec::{AlertCodec, AlertRecord, CodecConfig};
use alertsmith_protocol::settings::{KEY_DOCUMENT_PATH, KEY_REPO_ROOT, KEY_SECTION_KEY};
use alertsmith_protocol::{MemorySettings, SettingsStore};
use alertsmith_repo::find_root;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

pub(crate) mod document;
pub(crate) mod repo;

/// Loaded configuration plus the settings view commands read from.
pub(crate) struct Session {
    config: AppConfig,
    settings: MemorySettings,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let settings = config.settings();
        Self { config, settings }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn override_document(&mut self, path: &Path) -> Result<()> {
        self.settings
            .set_setting(KEY_DOCUMENT_PATH, &path.to_string_lossy())?;
        Ok(())
    }

    pub fn document_path(&self) -> Result<PathBuf> {
        self.settings
            .get_setting(KEY_DOCUMENT_PATH)
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("document.path is not configured"))
    }

    pub fn codec(&self) -> Result<AlertCodec> {
        let section_key = self
            .settings
            .get_setting(KEY_SECTION_KEY)
            .unwrap_or_else(|| self.config.codec.section_key.clone());
        let codec = AlertCodec::new(CodecConfig {
            section_key,
            indent_unit: self.config.codec.indent_unit.clone(),
        })?;
        Ok(codec)
    }

    pub fn read_document(&self) -> Result<(PathBuf, String)> {
        let path = self.document_path()?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok((path, text))
    }

    pub fn load_alerts(&self) -> Result<(AlertCodec, PathBuf, String, Vec<AlertRecord>)> {
        let codec = self.codec()?;
        let (path, text) = self.read_document()?;
        let alerts = codec
            .parse(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::debug!("{} alerts in {}", alerts.len(), path.display());
        Ok((codec, path, text, alerts))
    }

    /// Repository holding the document; remembered once found.
    pub fn repo_root(&mut self) -> Result<PathBuf> {
        if let Some(root) = self.settings.get_setting(KEY_REPO_ROOT) {
            return Ok(PathBuf::from(root));
        }
        let document = self.document_path()?;
        let root = find_root(&document)
            .ok_or_else(|| anyhow!("{} is not inside a git repository", document.display()))?;
        self.settings
            .set_setting(KEY_REPO_ROOT, &root.to_string_lossy())?;
        Ok(root)
    }
}
