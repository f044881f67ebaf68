//! TREND ESTIMATOR
//!
//! Fits `ndvi ≈ m·index + b` by ordinary least squares and returns `m`.
//!
//! The independent variable is the sample position (0..n-1), not elapsed
//! calendar time: irregular acquisition dates are treated as equally spaced.

use crate::error::AnalysisError;

/// Estimate the NDVI trend (slope per sample step)
///
/// A single sample has no trend and yields `0.0`. An empty series is rejected;
/// callers branch to a no-data result before getting here.
pub fn estimate_trend(values: &[f64]) -> Result<f64, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AnalysisError::NonFiniteSample { index, value });
    }

    let n = values.len();
    if n == 1 {
        return Ok(0.0);
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }

    // sxx > 0 for n >= 2
    Ok(sxy / sxx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decreasing_fixture() {
        let slope = estimate_trend(&[0.6, 0.5, 0.4]).unwrap();
        assert_relative_eq!(slope, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_single_point_has_no_trend() {
        assert_eq!(estimate_trend(&[0.42]).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(estimate_trend(&[]), Err(AnalysisError::EmptySeries));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let err = estimate_trend(&[0.5, f64::NAN, 0.4]).unwrap_err();
        assert!(matches!(err, AnalysisError::NonFiniteSample { index: 1, .. }));

        let err = estimate_trend(&[0.5, 0.4, f64::INFINITY]).unwrap_err();
        assert!(matches!(err, AnalysisError::NonFiniteSample { index: 2, .. }));
    }

    #[test]
    fn test_flat_series() {
        let slope = estimate_trend(&[0.6; 12]).unwrap();
        assert_relative_eq!(slope, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_noisy_series_matches_closed_form() {
        // Hand-computed: x̄ = 2, ȳ = 0.52, Σdx·dy = -0.77, Σdx² = 10
        let slope = estimate_trend(&[0.71, 0.55, 0.48, 0.52, 0.34]).unwrap();
        assert_relative_eq!(slope, -0.077, epsilon = 1e-12);
    }

    #[test]
    fn test_idempotent_bitwise() {
        let input = [0.61, 0.58, 0.63, 0.57, 0.55, 0.6, 0.52];
        let a = estimate_trend(&input).unwrap();
        let b = estimate_trend(&input).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
