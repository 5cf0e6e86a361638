/// Confidence helpers for species matches.
/// Percentages are on the 0.0–100.0 scale used by `MatchResult`.

use serde::{Deserialize, Serialize};

/// Display tier for a match confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
}

pub const HIGH_CONFIDENCE_PERCENT: f64 = 95.0;
pub const MODERATE_CONFIDENCE_PERCENT: f64 = 85.0;

impl ConfidenceBand {
    pub fn from_percent(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE_PERCENT {
            ConfidenceBand::High
        } else if confidence >= MODERATE_CONFIDENCE_PERCENT {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Clamp a raw score into [0.0, 100.0]. NaN maps to 0.0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
