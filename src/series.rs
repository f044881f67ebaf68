//! NDVI samples and series helpers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decimal places kept for NDVI values shown to clients.
pub const NDVI_DISPLAY_DECIMALS: i32 = 4;

/// One NDVI observation for a parcel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NdviSample {
    pub date: NaiveDate,
    pub ndvi: f64,
}

impl NdviSample {
    pub fn new(date: NaiveDate, ndvi: f64) -> Self {
        Self { date, ndvi }
    }

    /// Same sample with the value rounded for display
    pub fn rounded(&self) -> Self {
        Self {
            date: self.date,
            ndvi: round_to(self.ndvi, NDVI_DISPLAY_DECIMALS),
        }
    }
}

/// Extract the regression inputs (values in chronological order)
pub fn values(samples: &[NdviSample]) -> Vec<f64> {
    samples.iter().map(|s| s.ndvi).collect()
}

/// Sort samples chronologically. Stable, so same-day samples keep provider order.
pub fn sort_chronologically(samples: &mut [NdviSample]) {
    samples.sort_by_key(|s| s.date);
}

/// Round to `decimals` places, based on the exact binary value
///
/// 0.595 is stored as 0.59499999…, so it rounds to 0.59. Scaling by 10^n
/// first would round twice and give 0.6.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let precision = decimals.max(0) as usize;
    // adding 0.0 folds -0.0 into 0.0
    format!("{:.*}", precision, value)
        .parse::<f64>()
        .map(|rounded| rounded + 0.0)
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(0.123456, 4), 0.1235, epsilon = 1e-12);
        assert_relative_eq!(round_to(9.999999999999998, 2), 10.0, epsilon = 1e-12);
        assert_relative_eq!(round_to(-0.00004, 4), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_to_uses_exact_binary_value() {
        assert_eq!(round_to(0.595, 2), 0.59);
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(1.005, 2), 1.0);
        assert_eq!(round_to(-0.00004, 4).to_bits(), 0.0f64.to_bits());
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_sort_chronologically_is_stable() {
        let mut samples = vec![
            NdviSample::new(day(2024, 3, 1), 0.3),
            NdviSample::new(day(2024, 1, 1), 0.1),
            NdviSample::new(day(2024, 3, 1), 0.4),
        ];
        sort_chronologically(&mut samples);

        assert_eq!(values(&samples), vec![0.1, 0.3, 0.4]);
    }

    #[test]
    fn test_sample_serializes_iso_date() {
        let sample = NdviSample::new(day(2024, 5, 17), 0.61234567).rounded();
        let json = serde_json::to_value(sample).unwrap();

        assert_eq!(json["date"], "2024-05-17");
        assert_relative_eq!(json["ndvi"].as_f64().unwrap(), 0.6123, epsilon = 1e-12);
    }
}
