use serde::{Deserialize, Serialize};

use crate::threshold::{suggest_threshold, DurationStatistics, ThresholdMethod, ThresholdParams};
use crate::{Result, RulesError};

/// Keys accepted in the `[threshold]` table.
pub const THRESHOLD_KEYS: &[&str] = &["method", "multiplier", "min_std_dev", "min", "max", "offset"];

/// Threshold method plus its parameters, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub method: ThresholdMethod,
    #[serde(flatten)]
    pub params: ThresholdParams,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::StdDev,
            params: ThresholdParams {
                multiplier: Some(2.0),
                min_std_dev: Some(0.5),
                min: None,
                max: None,
                offset: None,
            },
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawThreshold {
    method: Option<String>,
    multiplier: Option<f64>,
    min_std_dev: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    offset: Option<f64>,
}

impl ThresholdConfig {
    /// Reads the `[threshold]` table of a TOML document. Other tables are
    /// ignored; a missing table yields the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let root: toml::Table = toml::from_str(text)
            .map_err(|err| RulesError::configuration(format!("TOML parse error: {err}")))?;
        match root.get("threshold") {
            Some(value) => Self::from_toml_value(value.clone()),
            None => Ok(Self::default()),
        }
    }

    /// Builds the config from the value of a `[threshold]` table.
    pub fn from_toml_value(value: toml::Value) -> Result<Self> {
        let toml::Value::Table(table) = &value else {
            return Err(RulesError::configuration("`threshold` must be a table"));
        };
        let mut unknown: Vec<String> = table
            .keys()
            .filter(|key| !THRESHOLD_KEYS.contains(&key.as_str()))
            .map(|key| format!("threshold.{key}"))
            .collect();
        unknown.sort();
        if !unknown.is_empty() {
            return Err(RulesError::configuration(format!(
                "unknown keys: {}",
                unknown.join(", ")
            )));
        }

        let raw: RawThreshold = value
            .try_into()
            .map_err(|err| RulesError::configuration(format!("threshold: {err}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawThreshold) -> Result<Self> {
        let defaults = Self::default();
        let method = match raw.method.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.method,
        };
        let params = match method {
            ThresholdMethod::StdDev => ThresholdParams {
                multiplier: raw.multiplier.or(defaults.params.multiplier),
                min_std_dev: raw.min_std_dev.or(defaults.params.min_std_dev),
                min: raw.min,
                max: raw.max,
                offset: raw.offset,
            },
            // formula has its own defaults; std_dev defaults do not leak in
            ThresholdMethod::Formula => ThresholdParams {
                multiplier: raw.multiplier,
                min_std_dev: raw.min_std_dev,
                min: raw.min,
                max: raw.max,
                offset: raw.offset,
            },
        };
        let cfg = Self { method, params };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        for (key, value) in [
            ("multiplier", p.multiplier),
            ("min_std_dev", p.min_std_dev),
            ("min", p.min),
            ("max", p.max),
            ("offset", p.offset),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(RulesError::configuration(format!(
                        "threshold.{key} must be a finite number"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (p.min, p.max) {
            if min > max {
                return Err(RulesError::configuration(format!(
                    "threshold.min ({min}) is greater than threshold.max ({max})"
                )));
            }
        }
        if p.multiplier.is_some_and(|m| m < 0.0) {
            return Err(RulesError::configuration(
                "threshold.multiplier must not be negative",
            ));
        }
        Ok(())
    }

    pub fn suggest(&self, stats: DurationStatistics) -> Result<f64> {
        suggest_threshold(stats, self.method, &self.params)
    }
}
