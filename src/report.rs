// Report and map pages rendered with Askama

use askama::Template;

use crate::series::NDVI_DISPLAY_DECIMALS;
use crate::services::parcel_store::ParcelRecord;

const MAP_ZOOM: u8 = 12;

/// Printable soil report for one parcel
#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub parcel_id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub score: String,
    pub recommendation: String,
    pub trend: String,
    pub status: String,
    pub synthetic: bool,
    /// (date, ndvi) pairs, already formatted
    pub rows: Vec<(String, String)>,
}

impl ReportTemplate {
    pub fn from_record(record: &ParcelRecord) -> Self {
        let insight = &record.insight;
        Self {
            parcel_id: record.id.clone(),
            name: record.name.clone(),
            created_at: record
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
            score: format!("{:.2}", insight.degradation_score),
            recommendation: insight.ai_message.clone(),
            trend: insight.ai_insight.clone(),
            status: insight.message.clone(),
            synthetic: insight.synthetic,
            rows: insight
                .series
                .iter()
                .map(|s| {
                    (
                        s.date.to_string(),
                        format!("{:.*}", NDVI_DISPLAY_DECIMALS as usize, s.ndvi),
                    )
                })
                .collect(),
        }
    }
}

/// Leaflet page: OpenStreetMap base with the NDVI tile overlay
#[derive(Debug, Clone, Template)]
#[template(path = "ndvi_map.html")]
pub struct MapTemplate {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub tile_url: String,
}

impl MapTemplate {
    pub fn new(lat: f64, lon: f64, tile_url: String) -> Self {
        Self { lat, lon, zoom: MAP_ZOOM, tile_url }
    }
}
