//! DEGRADATION SCORE
//!
//! Converts a trend slope into a non-negative decline magnitude:
//! `score = round(max(0, -slope × 100), 2)`.
//!
//! Only decline is quantified. Flat and improving trends floor at zero; the
//! direction of improvement is reported separately by the trend label.

use crate::series::round_to;

/// Decimal places of the reported score
pub const SCORE_DECIMALS: i32 = 2;

/// Scale from slope (NDVI per step) to score units
pub const SLOPE_SCALE: f64 = 100.0;

/// Degradation score for a fitted slope
pub fn degradation_score(slope: f64) -> f64 {
    let raw = -slope * SLOPE_SCALE;
    if raw > 0.0 {
        round_to(raw, SCORE_DECIMALS)
    } else {
        // Also keeps -0.0 out of responses
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decline_scales_and_rounds() {
        assert_relative_eq!(degradation_score(-0.1), 10.0, epsilon = 1e-12);
        assert_relative_eq!(degradation_score(-0.0012345), 0.12, epsilon = 1e-12);
        assert_relative_eq!(degradation_score(-0.0456789), 4.57, epsilon = 1e-12);
    }

    #[test]
    fn test_rounding_at_tier_boundary() {
        // raw 0.595 is just under the 0.6 "healthy" threshold
        let score = degradation_score(-0.595 / 100.0);
        assert_eq!(score, 0.59);
        assert_eq!(
            crate::analysis::RecommendationTier::from_score(score),
            crate::analysis::RecommendationTier::Stable
        );

        assert_eq!(degradation_score(-2.675 / 100.0), 2.67);
    }

    #[test]
    fn test_improvement_floors_at_zero() {
        assert_eq!(degradation_score(0.3), 0.0);
        assert_eq!(degradation_score(0.0).to_bits(), 0.0f64.to_bits());
        assert_eq!(degradation_score(-0.0).to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_no_upper_bound() {
        assert_relative_eq!(degradation_score(-1.5), 150.0, epsilon = 1e-12);
    }
}
