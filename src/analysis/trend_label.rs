//! Coarse trend label keyed on the raw slope.
//!
//! This classification does not look at the degradation score, so it can
//! disagree with [`RecommendationTier`](super::RecommendationTier) for the same
//! series. Both are reported.

use serde::{Deserialize, Serialize};

use super::trend::estimate_trend;
use crate::error::AnalysisError;

/// Slopes below this are degrading
pub const DEGRADING_BELOW: f64 = -0.05;
/// Slopes at or above this are improving
pub const IMPROVING_FROM: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    NoData,
    Degrading,
    Stable,
    Improving,
}

impl TrendLabel {
    pub fn from_slope(slope: f64) -> Self {
        if slope < DEGRADING_BELOW {
            TrendLabel::Degrading
        } else if slope < IMPROVING_FROM {
            TrendLabel::Stable
        } else {
            TrendLabel::Improving
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::NoData => "no_data",
            TrendLabel::Degrading => "degrading",
            TrendLabel::Stable => "stable",
            TrendLabel::Improving => "improving",
        }
    }

    /// Human-readable insight text
    pub fn display(&self) -> &'static str {
        match self {
            TrendLabel::NoData => "No data",
            TrendLabel::Degrading => "Soil degrading",
            TrendLabel::Stable => "Soil stable",
            TrendLabel::Improving => "Soil improving",
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display())
    }
}

/// Label a whole series; empty input yields the `No data` sentinel
pub fn classify_series(values: &[f64]) -> Result<TrendLabel, AnalysisError> {
    if values.is_empty() {
        return Ok(TrendLabel::NoData);
    }
    estimate_trend(values).map(TrendLabel::from_slope)
}
