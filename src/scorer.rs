//! Soil health scorer - combines trend, score, tier and label
//!
//! The recommendation tier is keyed on the degradation score while the trend
//! label is keyed on the slope. They answer different questions and are
//! returned side by side; no attempt is made to reconcile them.

use serde::Serialize;

use crate::acquisition::SeriesOutcome;
use crate::analysis::{degradation_score, estimate_trend, RecommendationTier, TrendLabel};
use crate::error::AnalysisError;
use crate::series;

/// Health assessment for one NDVI series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthAssessment {
    /// Fitted slope per sample step; `None` when there was no data
    pub slope: Option<f64>,
    pub score: f64,
    pub tier: RecommendationTier,
    pub label: TrendLabel,
}

impl HealthAssessment {
    /// Result for an empty series
    pub fn no_data() -> Self {
        Self {
            slope: None,
            score: 0.0,
            tier: RecommendationTier::from_score(0.0),
            label: TrendLabel::NoData,
        }
    }

    fn from_slope(slope: f64) -> Self {
        let score = degradation_score(slope);
        Self {
            slope: Some(slope),
            score,
            tier: RecommendationTier::from_score(score),
            label: TrendLabel::from_slope(slope),
        }
    }

    /// Drop the score to zero (and re-tier), keeping slope and label
    fn without_score(self) -> Self {
        Self {
            score: 0.0,
            tier: RecommendationTier::from_score(0.0),
            ..self
        }
    }
}

/// Score and label an NDVI series
///
/// Empty input is not an error: it yields [`HealthAssessment::no_data`].
/// Non-finite values are rejected.
pub fn score_and_label(values: &[f64]) -> Result<HealthAssessment, AnalysisError> {
    if values.is_empty() {
        return Ok(HealthAssessment::no_data());
    }
    estimate_trend(values).map(HealthAssessment::from_slope)
}

/// Assess an acquired series
///
/// Synthetic series carry no degradation signal, so their score is reported
/// as zero. The label is still computed from the samples.
pub fn assess_outcome(outcome: &SeriesOutcome) -> Result<HealthAssessment, AnalysisError> {
    let assessment = score_and_label(&series::values(&outcome.samples))?;
    if outcome.synthetic {
        Ok(assessment.without_score())
    } else {
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::SeriesSource;
    use crate::series::NdviSample;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_series_is_no_data() {
        let a = score_and_label(&[]).unwrap();
        assert_eq!(a.label, TrendLabel::NoData);
        assert_eq!(a.score, 0.0);
        assert_eq!(a.slope, None);
    }

    #[test]
    fn test_single_point() {
        let a = score_and_label(&[0.7]).unwrap();
        assert_eq!(a.slope, Some(0.0));
        assert_eq!(a.score, 0.0);
        assert_eq!(a.label, TrendLabel::Stable);
    }

    #[test]
    fn test_decreasing_fixture() {
        let a = score_and_label(&[0.6, 0.5, 0.4]).unwrap();
        assert_relative_eq!(a.slope.unwrap(), -0.1, epsilon = 1e-12);
        assert_eq!(a.score, 10.0);
        assert_eq!(a.tier, RecommendationTier::Healthy);
        assert_eq!(a.label, TrendLabel::Degrading);
    }

    #[test]
    fn test_increasing_series_scores_zero() {
        let a = score_and_label(&[0.1, 0.4, 0.7, 0.9]).unwrap();
        assert_eq!(a.score, 0.0);
        assert_eq!(a.label, TrendLabel::Improving);

        let gentle = score_and_label(&[0.50, 0.51, 0.52]).unwrap();
        assert_eq!(gentle.score, 0.0);
        assert_eq!(gentle.label, TrendLabel::Stable);
    }

    #[test]
    fn test_tier_and_label_can_disagree() {
        // Slight decline: label says stable, score 0.3 lands in moderate
        let a = score_and_label(&[0.603, 0.600, 0.597]).unwrap();
        assert_relative_eq!(a.score, 0.3, epsilon = 1e-12);
        assert_eq!(a.tier, RecommendationTier::Moderate);
        assert_eq!(a.label, TrendLabel::Stable);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(score_and_label(&[0.5, f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_synthetic_outcome_reports_zero_score() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let samples: Vec<NdviSample> = [0.7, 0.6, 0.5]
            .iter()
            .enumerate()
            .map(|(i, &v)| NdviSample::new(start + chrono::Duration::days(30 * i as i64), v))
            .collect();

        let outcome = SeriesOutcome {
            samples: samples.clone(),
            source: SeriesSource::FetchFailed { reason: "down".into() },
            synthetic: true,
        };
        let a = assess_outcome(&outcome).unwrap();
        assert_eq!(a.score, 0.0);
        assert_eq!(a.tier, RecommendationTier::Severe);
        assert_eq!(a.label, TrendLabel::Degrading);

        let real = assess_outcome(&SeriesOutcome::observed(samples)).unwrap();
        assert_relative_eq!(real.score, 10.0, epsilon = 1e-12);
    }
}
