use alertsmith_codec::CodecConfig;
use alertsmith_protocol::settings::{KEY_DOCUMENT_PATH, KEY_SECTION_KEY};
use alertsmith_protocol::MemorySettings;
use alertsmith_rules::ThresholdConfig;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "alertsmith.toml";
pub const CONFIG_ENV: &str = "ALERTSMITH_CONFIG";
pub const DEFAULT_DOCUMENT: &str = "alerts.tf";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub document_path: PathBuf,
    pub codec: CodecConfig,
    pub required_dirs: Vec<String>,
    pub threshold: ThresholdConfig,
    /// File the config was read from, if any
    pub source: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from(DEFAULT_DOCUMENT),
            codec: CodecConfig::default(),
            required_dirs: Vec::new(),
            threshold: ThresholdConfig::default(),
            source: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawAppConfig {
    #[serde(default)]
    document: Option<RawDocument>,
    #[serde(default)]
    layout: Option<RawLayout>,
    #[serde(default)]
    threshold: Option<toml::Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawDocument {
    path: Option<PathBuf>,
    section_key: Option<String>,
    indent: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawLayout {
    required_dirs: Option<Vec<String>>,
}

impl AppConfig {
    /// `--config`, then `$ALERTSMITH_CONFIG`, then `./alertsmith.toml` when
    /// present. Without any of them the defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        if let Some(path) = requested {
            return Self::from_file(&path);
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(&local);
        }
        log::debug!("no {CONFIG_FILE}; using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut cfg = Self::from_toml_str(&text, base)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        cfg.source = Some(path.to_path_buf());
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Relative document paths resolve against `base`.
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self> {
        let root: toml::Table = toml::from_str(text).context("TOML parse error")?;
        validate_keys(&root)?;
        let raw: RawAppConfig = toml::Value::Table(root)
            .try_into()
            .context("Config parse error")?;
        Self::from_raw(raw, base)
    }

    fn from_raw(raw: RawAppConfig, base: &Path) -> Result<Self> {
        let defaults = Self::default();
        let document = raw.document.unwrap_or_default();
        let layout = raw.layout.unwrap_or_default();

        let document_path = document.path.unwrap_or(defaults.document_path);
        let document_path = if document_path.is_relative() && !base.as_os_str().is_empty() {
            base.join(document_path)
        } else {
            document_path
        };

        let codec = CodecConfig {
            section_key: document
                .section_key
                .unwrap_or(defaults.codec.section_key),
            indent_unit: document.indent.unwrap_or(defaults.codec.indent_unit),
        };
        codec.validate().map_err(|msg| anyhow!("document: {msg}"))?;

        let threshold = match raw.threshold {
            Some(value) => ThresholdConfig::from_toml_value(value)?,
            None => defaults.threshold,
        };

        Ok(Self {
            document_path,
            codec,
            required_dirs: layout.required_dirs.unwrap_or_default(),
            threshold,
            source: None,
        })
    }

    /// Settings view handed to the rest of the application.
    pub fn settings(&self) -> MemorySettings {
        MemorySettings::new()
            .with(
                KEY_DOCUMENT_PATH,
                self.document_path.to_string_lossy().into_owned(),
            )
            .with(KEY_SECTION_KEY, self.codec.section_key.clone())
    }
}

fn validate_keys(root: &toml::Table) -> Result<()> {
    fn check(unknown: &mut Vec<String>, table: &toml::Table, base: &str, allowed: &[&str]) {
        for key in table.keys() {
            if !allowed.contains(&key.as_str()) {
                if base.is_empty() {
                    unknown.push(key.to_string());
                } else {
                    unknown.push(format!("{base}.{key}"));
                }
            }
        }
    }

    let mut unknown = Vec::new();
    check(&mut unknown, root, "", &["document", "layout", "threshold"]);
    if let Some(toml::Value::Table(document)) = root.get("document") {
        check(&mut unknown, document, "document", &["path", "section_key", "indent"]);
    }
    if let Some(toml::Value::Table(layout)) = root.get("layout") {
        check(&mut unknown, layout, "layout", &["required_dirs"]);
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        unknown.sort();
        Err(anyhow!("Unknown config keys: {}", unknown.join(", ")))
    }
}
