//! Soil Scorer Rust Implementation
//!
//! Soil-health assessment from NDVI time series over user-drawn parcels.
//!
//! Layout:
//! - `analysis/`: trend estimator, degradation score, recommendation tier,
//!   trend label, fallback series synthesizer
//! - `scorer`: combines the analysis steps into one assessment
//! - `acquisition`: imagery fetch with an explicit fallback outcome
//! - `services/`: imagery, parcel storage, auth and PDF collaborators
//! - `api_server`: HTTP surface (feature `api`)

pub mod error;
pub mod series;
pub mod analysis;
pub mod scorer;
pub mod acquisition;
pub mod services;
pub mod parcel;
pub mod config;

#[cfg(feature = "api")]
pub mod report;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::AnalysisError;
pub use series::NdviSample;
pub use analysis::{
    classify_series, degradation_score, estimate_trend, synthesize_series, FallbackParams,
    RecommendationTier, TrendLabel,
};
pub use scorer::{assess_outcome, score_and_label, HealthAssessment};
pub use acquisition::{acquire_series, FallbackPolicy, SeriesOutcome, SeriesSource};
pub use parcel::ParcelGeometry;
pub use config::Config;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
