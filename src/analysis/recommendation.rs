//! Recommendation tiers keyed on the degradation score.
//!
//! Thresholds are half-open on the lower side: a score exactly on a boundary
//! belongs to the higher tier.

use serde::{Deserialize, Serialize};

pub const SEVERE_BELOW: f64 = 0.2;
pub const MODERATE_BELOW: f64 = 0.4;
pub const STABLE_BELOW: f64 = 0.6;

/// Recommendation tier derived from the degradation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Severe,
    Moderate,
    Stable,
    Healthy,
}

impl RecommendationTier {
    /// Classify a degradation score.
    /// - < 0.2: Severe
    /// - 0.2-0.4: Moderate
    /// - 0.4-0.6: Stable
    /// - ≥ 0.6: Healthy
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < SEVERE_BELOW => RecommendationTier::Severe,
            s if s < MODERATE_BELOW => RecommendationTier::Moderate,
            s if s < STABLE_BELOW => RecommendationTier::Stable,
            _ => RecommendationTier::Healthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationTier::Severe => "severe",
            RecommendationTier::Moderate => "moderate",
            RecommendationTier::Stable => "stable",
            RecommendationTier::Healthy => "healthy",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RecommendationTier::Severe => "🚨",
            RecommendationTier::Moderate => "⚠️",
            RecommendationTier::Stable => "🙂",
            RecommendationTier::Healthy => "🌿",
        }
    }

    /// Land-management advice shown to the parcel owner
    pub fn message(&self) -> &'static str {
        match self {
            RecommendationTier::Severe => {
                "Severe degradation — consider reforestation, cover crops, and soil restoration."
            }
            RecommendationTier::Moderate => {
                "Moderate degradation — apply soil fertility improvement and erosion control."
            }
            RecommendationTier::Stable => "Stable soil — maintain current land management.",
            RecommendationTier::Healthy => {
                "Healthy soil — continue sustainable farming practices."
            }
        }
    }

    /// Icon-prefixed message, as displayed in the web client
    pub fn display_message(&self) -> String {
        format!("{} {}", self.icon(), self.message())
    }
}

impl std::fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_upper_tier() {
        assert_eq!(RecommendationTier::from_score(0.2), RecommendationTier::Moderate);
        assert_eq!(RecommendationTier::from_score(0.4), RecommendationTier::Stable);
        assert_eq!(RecommendationTier::from_score(0.6), RecommendationTier::Healthy);
    }

    #[test]
    fn test_interior_values() {
        assert_eq!(RecommendationTier::from_score(0.0), RecommendationTier::Severe);
        assert_eq!(RecommendationTier::from_score(0.19), RecommendationTier::Severe);
        assert_eq!(RecommendationTier::from_score(0.39), RecommendationTier::Moderate);
        assert_eq!(RecommendationTier::from_score(0.59), RecommendationTier::Stable);
        assert_eq!(RecommendationTier::from_score(10.0), RecommendationTier::Healthy);
    }

    #[test]
    fn test_serialized_name() {
        let json = serde_json::to_string(&RecommendationTier::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
        assert!(RecommendationTier::Severe.display_message().starts_with("🚨 Severe"));
    }
}
