//! Parcel boundaries drawn by the user
//!
//! The client posts a GeoJSON Feature. Only polygonal geometries describe a
//! parcel; anything else is rejected before reaching the imagery provider.

use geo::{Centroid, ChamberlainDuquetteArea, MultiPolygon};
use geojson::Feature;

const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("feature is not valid GeoJSON: {0}")]
    NotAFeature(String),

    #[error("feature has no geometry")]
    Missing,

    #[error("expected Polygon or MultiPolygon, got {0}")]
    NotPolygonal(&'static str),

    #[error("geometry could not be converted: {0}")]
    Conversion(String),

    #[error("polygon has no area")]
    Degenerate,
}

/// A validated parcel boundary
#[derive(Debug, Clone)]
pub struct ParcelGeometry {
    /// Geometry as sent to the imagery provider (lon/lat, EPSG:4326)
    pub geojson: geojson::Geometry,
    shape: MultiPolygon<f64>,
}

impl ParcelGeometry {
    /// Parse the `feature` field of a request
    pub fn from_feature_value(value: &serde_json::Value) -> Result<Self, GeometryError> {
        let feature: Feature = serde_json::from_value(value.clone())
            .map_err(|e| GeometryError::NotAFeature(e.to_string()))?;
        let geometry = feature.geometry.ok_or(GeometryError::Missing)?;
        Self::from_geometry(geometry)
    }

    pub fn from_geometry(geometry: geojson::Geometry) -> Result<Self, GeometryError> {
        let shape: geo::Geometry<f64> = geometry
            .clone()
            .try_into()
            .map_err(|e: geojson::Error| GeometryError::Conversion(e.to_string()))?;

        let shape = match shape {
            geo::Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            geo::Geometry::MultiPolygon(multi) => multi,
            geo::Geometry::Point(_) => return Err(GeometryError::NotPolygonal("Point")),
            geo::Geometry::MultiPoint(_) => return Err(GeometryError::NotPolygonal("MultiPoint")),
            geo::Geometry::LineString(_) => return Err(GeometryError::NotPolygonal("LineString")),
            geo::Geometry::MultiLineString(_) => {
                return Err(GeometryError::NotPolygonal("MultiLineString"))
            }
            _ => return Err(GeometryError::NotPolygonal("GeometryCollection")),
        };

        if shape.0.iter().all(|p| p.exterior().0.len() < 4) {
            return Err(GeometryError::Degenerate);
        }

        Ok(Self { geojson: geometry, shape })
    }

    /// Centroid as (lat, lon), for centering maps
    pub fn centroid_lat_lon(&self) -> Option<(f64, f64)> {
        self.shape.centroid().map(|p| (p.y(), p.x()))
    }

    /// Approximate area on the sphere, in hectares
    pub fn area_hectares(&self) -> f64 {
        self.shape.chamberlain_duquette_unsigned_area() / SQUARE_METRES_PER_HECTARE
    }
}
