//! Analysis modules for parcel health scoring
//!
//! Each step of the NDVI pipeline lives in its own module:
//! - `trend`: least-squares slope over the series
//! - `degradation`: slope → degradation score
//! - `recommendation`: score → recommendation tier
//! - `trend_label`: slope → coarse trend label (independent of the score)
//! - `fallback`: synthetic series when imagery is unavailable

pub mod trend;
pub mod degradation;
pub mod recommendation;
pub mod trend_label;
pub mod fallback;

// Re-export analysis functions
pub use trend::estimate_trend;
pub use degradation::degradation_score;
pub use recommendation::RecommendationTier;
pub use trend_label::{classify_series, TrendLabel};
pub use fallback::{synthesize_series, FallbackParams};
