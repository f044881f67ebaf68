//! Imagery provider - NDVI series and tile layers for a parcel
//!
//! The provider is an external analysis platform (Landsat 8 surface
//! reflectance, reduced to a per-image regional mean). This crate only
//! consumes its results; no pixel processing happens here.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::series::{sort_chronologically, NdviSample};

/// Default imagery collection (Landsat 8 C02 T1 surface reflectance)
pub const DEFAULT_COLLECTION: &str = "LANDSAT/LC08/C02/T1_L2";

/// Spatial scale (metres) for the regional mean reduction
pub const REDUCE_SCALE_M: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Query for a parcel NDVI series
#[derive(Debug, Clone, Serialize)]
pub struct NdviQuery {
    pub geometry: geojson::Geometry,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl NdviQuery {
    /// Stable key for caching fetched series
    pub fn cache_key(&self) -> String {
        format!("ndvi:{}:{}:{}", self.geometry, self.start, self.end)
    }
}

/// Visualization parameters for the NDVI tile layer
#[derive(Debug, Clone, Serialize)]
pub struct TileStyle {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

impl Default for TileStyle {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            palette: vec!["brown".to_string(), "yellow".to_string(), "green".to_string()],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageryError {
    #[error("imagery provider not initialized: {reason}")]
    Unavailable { reason: String },

    #[error("imagery request failed: {0}")]
    Request(String),

    #[error("imagery provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed imagery response: {0}")]
    Malformed(String),
}

/// Source of NDVI observations
///
/// Implementations block; the HTTP layer calls them from the blocking pool.
pub trait NdviProvider: Send + Sync {
    /// Fetch the NDVI series for a parcel. Order of the result is chronological.
    fn fetch_series(&self, query: &NdviQuery) -> Result<Vec<NdviSample>, ImageryError>;

    /// Tile URL template (`{z}/{x}/{y}`) of the least-cloudy NDVI image
    fn tile_url(&self, query: &NdviQuery, style: &TileStyle) -> Result<String, ImageryError>;
}

/// Provider used when the imagery platform could not be initialized
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl NdviProvider for UnavailableProvider {
    fn fetch_series(&self, _query: &NdviQuery) -> Result<Vec<NdviSample>, ImageryError> {
        Err(ImageryError::Unavailable { reason: self.reason.clone() })
    }

    fn tile_url(&self, _query: &NdviQuery, _style: &TileStyle) -> Result<String, ImageryError> {
        Err(ImageryError::Unavailable { reason: self.reason.clone() })
    }
}

/// Request body for the series endpoint
#[derive(Serialize)]
struct SeriesRequest<'a> {
    collection: &'a str,
    geometry: &'a geojson::Geometry,
    start: NaiveDate,
    end: NaiveDate,
    bands: [&'a str; 2],
    scale: u32,
}

/// Series endpoint response: one feature per image
#[derive(Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    features: Vec<SeriesFeature>,
}

#[derive(Deserialize)]
struct SeriesFeature {
    properties: SeriesProperties,
}

#[derive(Deserialize)]
struct SeriesProperties {
    date: String,
    ndvi: Option<f64>,
}

#[derive(Serialize)]
struct TileRequest<'a> {
    collection: &'a str,
    geometry: &'a geojson::Geometry,
    start: NaiveDate,
    end: NaiveDate,
    bands: [&'a str; 2],
    sort: &'a str,
    vis: &'a TileStyle,
}

#[derive(Deserialize)]
struct TileResponse {
    url_format: String,
}

/// HTTP client for an NDVI analysis service
///
/// Endpoints (relative to `base_url`):
/// - `POST /ndvi/series` → `{"features":[{"properties":{"date":"YYYY-MM-DD","ndvi":0.61}}]}`
/// - `POST /ndvi/tiles`  → `{"url_format":"https://…/{z}/{x}/{y}"}`
pub struct HttpNdviProvider {
    base_url: String,
    token: Option<String>,
    collection: String,
}

impl HttpNdviProvider {
    pub fn new(base_url: &str, token: Option<String>, collection: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            collection: collection.to_string(),
        }
    }

    // NIR, red
    const NDVI_BANDS: [&'static str; 2] = ["SR_B5", "SR_B4"];

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::blocking::Response, ImageryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ImageryError::Request(e.to_string()))?;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "Imagery request");

        let mut request = client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| ImageryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ImageryError::Status { status, body });
        }

        Ok(response)
    }
}

impl NdviProvider for HttpNdviProvider {
    fn fetch_series(&self, query: &NdviQuery) -> Result<Vec<NdviSample>, ImageryError> {
        let body = SeriesRequest {
            collection: &self.collection,
            geometry: &query.geometry,
            start: query.start,
            end: query.end,
            bands: Self::NDVI_BANDS,
            scale: REDUCE_SCALE_M,
        };

        let response: SeriesResponse = self
            .post("/ndvi/series", &body)?
            .json()
            .map_err(|e| ImageryError::Malformed(e.to_string()))?;

        let samples = parse_features(response.features)?;
        tracing::info!(samples = samples.len(), "Fetched NDVI series");
        Ok(samples)
    }

    fn tile_url(&self, query: &NdviQuery, style: &TileStyle) -> Result<String, ImageryError> {
        let body = TileRequest {
            collection: &self.collection,
            geometry: &query.geometry,
            start: query.start,
            end: query.end,
            bands: Self::NDVI_BANDS,
            sort: "CLOUD_COVER",
            vis: style,
        };

        let response: TileResponse = self
            .post("/ndvi/tiles", &body)?
            .json()
            .map_err(|e| ImageryError::Malformed(e.to_string()))?;

        Ok(response.url_format)
    }
}

/// Drop images without a regional mean, parse dates, sort chronologically
fn parse_features(features: Vec<SeriesFeature>) -> Result<Vec<NdviSample>, ImageryError> {
    let mut samples = Vec::with_capacity(features.len());
    for feature in features {
        let Some(ndvi) = feature.properties.ndvi else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&feature.properties.date, "%Y-%m-%d").map_err(|e| {
            ImageryError::Malformed(format!("bad date '{}': {}", feature.properties.date, e))
        })?;
        samples.push(NdviSample::new(date, ndvi));
    }
    sort_chronologically(&mut samples);
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_features_skips_null_and_sorts() {
        let json = r#"{"features": [
            {"properties": {"date": "2024-03-10", "ndvi": 0.52}},
            {"properties": {"date": "2024-01-05", "ndvi": 0.61}},
            {"properties": {"date": "2024-02-01", "ndvi": null}}
        ]}"#;
        let response: SeriesResponse = serde_json::from_str(json).unwrap();
        let samples = parse_features(response.features).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].date.to_string(), "2024-01-05");
        assert_eq!(samples[1].ndvi, 0.52);
    }

    #[test]
    fn test_parse_features_rejects_bad_date() {
        let json = r#"{"features": [{"properties": {"date": "10/03/2024", "ndvi": 0.5}}]}"#;
        let response: SeriesResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parse_features(response.features),
            Err(ImageryError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_features_is_empty() {
        let response: SeriesResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_features(response.features).unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_provider_reports_reason() {
        let provider = UnavailableProvider::new("IMAGERY_URL not set");
        let query = NdviQuery {
            geometry: geojson::Geometry::new(geojson::Value::Point(vec![0.0, 0.0])),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let err = provider.fetch_series(&query).unwrap_err();
        assert!(err.to_string().contains("IMAGERY_URL not set"));
    }
}
