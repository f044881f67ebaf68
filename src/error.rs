//! Error types for the analysis core.

/// Rejected input to the trend estimator.
///
/// Both variants are invalid-input conditions: an empty series must be
/// handled by the caller (see [`crate::score_and_label`]), and non-finite
/// samples never reach the regression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid input: NDVI series is empty")]
    EmptySeries,

    #[error("invalid input: sample {index} is not finite ({value})")]
    NonFiniteSample { index: usize, value: f64 },
}
