use serde::{Deserialize, Serialize};

use crate::{Result, RulesError};

/// No suggestion goes below this many seconds.
pub const ABSOLUTE_FLOOR: f64 = 3.0;
pub const DEFAULT_FORMULA_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_FORMULA_OFFSET: f64 = 3.0;

/// Observed duration statistics for one carrier, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationStatistics {
    pub average_duration: f64,
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    #[default]
    StdDev,
    Formula,
}

impl std::str::FromStr for ThresholdMethod {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "std_dev" | "stddev" => Ok(Self::StdDev),
            "formula" => Ok(Self::Formula),
            other => Err(RulesError::configuration(format!(
                "unknown threshold method `{other}` (expected `std_dev` or `formula`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Required for `std_dev`; `formula` falls back to 1.5
    pub multiplier: Option<f64>,
    /// Floor applied to the standard deviation before scaling
    pub min_std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Added by `formula`; defaults to 3.0
    pub offset: Option<f64>,
}

/// Suggested critical threshold in seconds, always a multiple of 0.5.
pub fn suggest_threshold(
    stats: DurationStatistics,
    method: ThresholdMethod,
    params: &ThresholdParams,
) -> Result<f64> {
    if !stats.average_duration.is_finite() || !stats.standard_deviation.is_finite() {
        return Err(RulesError::InvalidStatistics(format!(
            "average {} / standard deviation {}",
            stats.average_duration, stats.standard_deviation
        )));
    }

    let suggestion = match method {
        ThresholdMethod::StdDev => {
            let multiplier = params.multiplier.ok_or_else(|| {
                RulesError::configuration("std_dev threshold method requires `multiplier`")
            })?;
            let std_dev = match params.min_std_dev {
                Some(floor) => stats.standard_deviation.max(floor),
                None => stats.standard_deviation,
            };
            let mut proposed = stats.average_duration + multiplier * std_dev;
            if let Some(min) = params.min {
                proposed = proposed.max(min);
            }
            if let Some(max) = params.max {
                proposed = proposed.min(max);
            }
            round_to_half(proposed.max(ABSOLUTE_FLOOR))
        }
        ThresholdMethod::Formula => {
            let multiplier = params.multiplier.unwrap_or(DEFAULT_FORMULA_MULTIPLIER);
            let offset = params.offset.unwrap_or(DEFAULT_FORMULA_OFFSET);
            let proposed = round_to_cents(stats.average_duration * multiplier + offset);
            round_to_half(proposed)
        }
    };

    log::debug!(
        "threshold suggestion ({method:?}) for avg={} sd={}: {suggestion}",
        stats.average_duration,
        stats.standard_deviation
    );
    Ok(suggestion)
}

/// Nearest multiple of 0.5; halves round away from zero.
pub fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
