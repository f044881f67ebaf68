//! Server configuration from environment variables
//!
//! Every collaborator is optional. A missing service falls back to a local
//! stand-in (in-memory store, disabled auth, synthetic NDVI, HTML report).

use chrono::NaiveDate;

use crate::acquisition::FallbackPolicy;
use crate::services::imagery::DEFAULT_COLLECTION;

pub const DEFAULT_PORT: u16 = 7860;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Hosted auth + REST database
#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
}

/// NDVI analysis service
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryConfig {
    pub url: String,
    pub token: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub supabase: Option<SupabaseConfig>,
    pub imagery: Option<ImageryConfig>,
    pub pdf_renderer_url: Option<String>,
    /// First day of the NDVI query window; the window ends today
    pub ndvi_start: NaiveDate,
    /// Fixed seed for the fallback synthesizer (reproducible runs)
    pub fallback_seed: Option<u64>,
    /// When a synthetic series replaces the provider's
    pub fallback_policy: FallbackPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            supabase: None,
            imagery: None,
            pdf_renderer_url: None,
            ndvi_start: default_ndvi_start(),
            fallback_seed: None,
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            expected: "true or false",
            value,
        }),
    }
}

fn default_ndvi_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseConfig { url, key }),
            _ => None,
        };

        let imagery = get("IMAGERY_URL").map(|url| ImageryConfig {
            url,
            token: get("IMAGERY_TOKEN"),
            collection: get("IMAGERY_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        });

        let ndvi_start = match get("NDVI_START_DATE") {
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                ConfigError::Invalid {
                    key: "NDVI_START_DATE",
                    expected: "a YYYY-MM-DD date",
                    value,
                }
            })?,
            None => default_ndvi_start(),
        };

        let fallback_seed = match get("FALLBACK_SEED") {
            Some(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                key: "FALLBACK_SEED",
                expected: "an unsigned integer",
                value,
            })?),
            None => None,
        };

        let mut fallback_policy = FallbackPolicy::default();
        if let Some(value) = get("FALLBACK_ON_FAILURE") {
            fallback_policy.synthesize_on_failure = parse_flag("FALLBACK_ON_FAILURE", value)?;
        }
        if let Some(value) = get("FALLBACK_ON_EMPTY") {
            fallback_policy.synthesize_on_empty = parse_flag("FALLBACK_ON_EMPTY", value)?;
        }

        Ok(Self {
            port,
            supabase,
            imagery,
            pdf_renderer_url: get("PDF_RENDERER_URL"),
            ndvi_start,
            fallback_seed,
            fallback_policy,
        })
    }
}
