//! Parcel persistence
//!
//! Parcels live in a hosted Postgres table exposed over a PostgREST API
//! (`/rest/v1/parcels`). An in-memory store is used when no database is
//! configured.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::analysis::{RecommendationTier, TrendLabel};
use crate::series::NdviSample;

const PARCELS_TABLE: &str = "parcels";

/// Insight blob stored alongside a parcel
///
/// Older rows only carry `ai_insight` and `series`; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelInsight {
    /// Trend label display text ("Soil stable", ...)
    pub ai_insight: String,
    pub trend_label: TrendLabel,
    pub degradation_score: f64,
    pub tier: RecommendationTier,
    pub ai_message: String,
    pub synthetic: bool,
    pub message: String,
    pub series: Vec<NdviSample>,
}

impl Default for ParcelInsight {
    fn default() -> Self {
        let tier = RecommendationTier::from_score(0.0);
        Self {
            ai_insight: String::new(),
            trend_label: TrendLabel::NoData,
            degradation_score: 0.0,
            tier,
            ai_message: tier.display_message(),
            synthetic: false,
            message: String::new(),
            series: Vec::new(),
        }
    }
}

/// One row of the parcels table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// The user-drawn GeoJSON feature
    pub geom: serde_json::Value,
    #[serde(rename = "ai_insight")]
    pub insight: ParcelInsight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("parcel store request failed: {0}")]
    Request(String),

    #[error("parcel store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed parcel row: {0}")]
    Malformed(String),

    #[error("parcel store lock poisoned")]
    Poisoned,
}

/// Persistence seam for parcel records
pub trait ParcelStore: Send + Sync {
    fn insert(&self, record: &ParcelRecord) -> Result<(), StoreError>;

    fn get(&self, parcel_id: &str) -> Result<Option<ParcelRecord>, StoreError>;
}

/// Process-local store
#[derive(Default)]
pub struct InMemoryParcelStore {
    parcels: RwLock<HashMap<String, ParcelRecord>>,
}

impl InMemoryParcelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parcels.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParcelStore for InMemoryParcelStore {
    fn insert(&self, record: &ParcelRecord) -> Result<(), StoreError> {
        let mut parcels = self.parcels.write().map_err(|_| StoreError::Poisoned)?;
        let mut record = record.clone();
        record.created_at.get_or_insert_with(Utc::now);
        parcels.insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, parcel_id: &str) -> Result<Option<ParcelRecord>, StoreError> {
        let parcels = self.parcels.read().map_err(|_| StoreError::Poisoned)?;
        Ok(parcels.get(parcel_id).cloned())
    }
}

/// PostgREST-backed store (hosted database REST endpoint)
pub struct RestParcelStore {
    base_url: String,
    api_key: String,
}

impl RestParcelStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, PARCELS_TABLE)
    }
}

impl ParcelStore for RestParcelStore {
    fn insert(&self, record: &ParcelRecord) -> Result<(), StoreError> {
        let response = Client::new()
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(())
    }

    fn get(&self, parcel_id: &str) -> Result<Option<ParcelRecord>, StoreError> {
        let url = format!(
            "{}?id=eq.{}&select=*",
            self.table_url(),
            urlencoding::encode(parcel_id)
        );

        let response = Client::new()
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(parse_row)
            .transpose()
    }
}

/// Rows written by older clients hold `geom` and `ai_insight` as JSON-encoded
/// strings rather than jsonb; accept both.
fn parse_row(mut row: serde_json::Value) -> Result<ParcelRecord, StoreError> {
    for column in ["geom", "ai_insight"] {
        if let Some(serde_json::Value::String(encoded)) = row.get(column).cloned() {
            let decoded: serde_json::Value = serde_json::from_str(&encoded)
                .map_err(|e| StoreError::Malformed(format!("{}: {}", column, e)))?;
            row[column] = decoded;
        }
    }
    serde_json::from_value(row).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str) -> ParcelRecord {
        ParcelRecord {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            name: "North field".to_string(),
            geom: serde_json::json!({"type": "Feature", "geometry": null, "properties": {}}),
            insight: ParcelInsight {
                ai_insight: "Soil stable".to_string(),
                trend_label: TrendLabel::Stable,
                degradation_score: 0.0,
                tier: RecommendationTier::Severe,
                ai_message: RecommendationTier::Severe.display_message(),
                synthetic: false,
                message: "ok".to_string(),
                series: vec![NdviSample::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 0.5)],
            },
            created_at: None,
        }
    }

    #[test]
    fn test_in_memory_round_trip() {
        let store = InMemoryParcelStore::new();
        store.insert(&record("parcel-a")).unwrap();

        let fetched = store.get("parcel-a").unwrap().unwrap();
        assert_eq!(fetched.name, "North field");
        assert!(fetched.created_at.is_some());
        assert!(store.get("parcel-b").unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_parse_row_accepts_string_encoded_columns() {
        let original = record("parcel-a");
        let mut row = serde_json::to_value(&original).unwrap();
        row["geom"] = serde_json::Value::String(original.geom.to_string());
        row["ai_insight"] =
            serde_json::Value::String(serde_json::to_string(&original.insight).unwrap());

        let parsed = parse_row(row).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_row_accepts_legacy_insight() {
        let row = serde_json::json!({
            "id": "parcel-old",
            "user_id": "user-1",
            "name": "Old field",
            "geom": "{\"type\": \"Feature\"}",
            "ai_insight": "{\"ai_insight\": \"Soil degrading\", \"series\": [{\"date\": \"2023-02-01\", \"ndvi\": 0.41}]}"
        });

        let parsed = parse_row(row).unwrap();
        assert_eq!(parsed.insight.ai_insight, "Soil degrading");
        assert_eq!(parsed.insight.series.len(), 1);
        assert_eq!(parsed.insight.trend_label, TrendLabel::NoData);
        assert!(parsed.created_at.is_none());
    }
}
