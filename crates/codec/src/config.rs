use serde::{Deserialize, Serialize};

/// Configuration for locating and rendering the alert section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Attribute whose list literal holds the alert blocks
    pub section_key: String,

    /// One level of indentation used when rendering blocks canonically
    pub indent_unit: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            section_key: "alerts".to_string(),
            indent_unit: "  ".to_string(),
        }
    }
}

impl CodecConfig {
    /// Config for a document whose section uses another attribute name
    pub fn for_section(key: impl Into<String>) -> Self {
        Self {
            section_key: key.into(),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let key = self.section_key.as_str();
        if key.is_empty() {
            return Err("section_key must not be empty".to_string());
        }
        let starts_ok = key
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !starts_ok
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("section_key `{key}` is not a plain identifier"));
        }

        if self.indent_unit.is_empty() || !self.indent_unit.chars().all(|c| c == ' ' || c == '\t')
        {
            return Err("indent_unit must be spaces or tabs".to_string());
        }

        Ok(())
    }
}

/// What `replace` does when the document has no alert section yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Fail with `SectionNotFound`
    #[default]
    ExistingOnly,

    /// Append a new section at the end of the document
    CreateIfMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(CodecConfig::default().validate().is_ok());
        assert!(CodecConfig::for_section("carrier_alerts").validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(CodecConfig::for_section("").validate().is_err());
        assert!(CodecConfig::for_section("9lives").validate().is_err());
        assert!(CodecConfig::for_section("a.b").validate().is_err());

        let config = CodecConfig {
            indent_unit: "->".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
