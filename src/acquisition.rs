//! Series acquisition - imagery fetch with explicit fallback outcome
//!
//! Turns a provider result into a [`SeriesOutcome`] that records which path
//! produced the samples: real observations, or a synthetic series because the
//! provider was unavailable, failed, returned nothing, or returned unusable
//! values. Callers and tests assert on [`SeriesSource`] instead of parsing
//! status text.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::analysis::fallback::synthesize_series;
use crate::services::imagery::{ImageryError, NdviProvider, NdviQuery};
use crate::series::NdviSample;

/// Why the series looks the way it does
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesSource {
    /// Samples came from the imagery provider
    Observed,
    /// Provider was never initialized (missing configuration)
    ProviderUnavailable { reason: String },
    /// Provider call failed
    FetchFailed { reason: String },
    /// Provider succeeded with no usable images in the window
    EmptyResult,
    /// Provider returned samples the estimator would reject
    Rejected { reason: String },
}

/// When to substitute a synthetic series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Synthesize on provider failure or unusable samples
    pub synthesize_on_failure: bool,
    /// Synthesize when the provider returns an empty series
    pub synthesize_on_empty: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            synthesize_on_failure: true,
            synthesize_on_empty: true,
        }
    }
}

/// Samples plus provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesOutcome {
    pub samples: Vec<NdviSample>,
    pub source: SeriesSource,
    pub synthetic: bool,
}

impl SeriesOutcome {
    pub fn observed(samples: Vec<NdviSample>) -> Self {
        Self {
            samples,
            source: SeriesSource::Observed,
            synthetic: false,
        }
    }

    /// Status line shown to the user
    pub fn status_message(&self) -> String {
        let detail = match &self.source {
            SeriesSource::Observed => {
                return "NDVI computed from Landsat 8 SR real data".to_string();
            }
            SeriesSource::ProviderUnavailable { reason } => {
                format!("Imagery provider init failed: {}", reason)
            }
            SeriesSource::FetchFailed { reason } => format!("Imagery provider error: {}", reason),
            SeriesSource::EmptyResult => "No NDVI values found".to_string(),
            SeriesSource::Rejected { reason } => format!("Invalid NDVI samples: {}", reason),
        };

        if self.synthetic {
            format!("NDVI simulation used. {}", detail)
        } else {
            detail
        }
    }
}

/// Fetch from the provider and resolve the outcome
pub fn acquire_series<R: Rng + ?Sized>(
    provider: &dyn NdviProvider,
    query: &NdviQuery,
    policy: FallbackPolicy,
    rng: &mut R,
    today: NaiveDate,
) -> SeriesOutcome {
    resolve_fetch(provider.fetch_series(query), policy, rng, today)
}

/// Resolve an already-completed fetch (the API layer fetches off-thread and
/// may serve cached series)
pub fn resolve_fetch<R: Rng + ?Sized>(
    fetched: Result<Vec<NdviSample>, ImageryError>,
    policy: FallbackPolicy,
    rng: &mut R,
    today: NaiveDate,
) -> SeriesOutcome {
    let (source, synthesize) = match fetched {
        Ok(samples) if samples.is_empty() => (SeriesSource::EmptyResult, policy.synthesize_on_empty),
        Ok(samples) => match samples.iter().position(|s| !s.ndvi.is_finite()) {
            None => return SeriesOutcome::observed(samples),
            Some(index) => (
                SeriesSource::Rejected {
                    reason: format!("sample {} ({}) is not finite", index, samples[index].date),
                },
                policy.synthesize_on_failure,
            ),
        },
        Err(ImageryError::Unavailable { reason }) => (
            SeriesSource::ProviderUnavailable { reason },
            policy.synthesize_on_failure,
        ),
        Err(e) => (
            SeriesSource::FetchFailed { reason: e.to_string() },
            policy.synthesize_on_failure,
        ),
    };

    if synthesize {
        tracing::warn!(?source, "Using synthetic NDVI series");
        SeriesOutcome {
            samples: synthesize_series(rng, today),
            source,
            synthetic: true,
        }
    } else {
        tracing::info!(?source, "No usable NDVI series");
        SeriesOutcome {
            samples: Vec::new(),
            source,
            synthetic: false,
        }
    }
}
