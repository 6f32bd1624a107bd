use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, Result};

// Minimal GeoJSON shapes needed to pull the anomaly ring out of a survey export
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Feature {
    pub geometry: Option<GeometryData>,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

// Coordinates stay untyped until the geometry type is known
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeometryData {
    pub r#type: String,
    pub coordinates: serde_json::Value,
}

impl GeometryData {
    /// Exterior ring of a Polygon geometry as (lon, lat) pairs. Holes are ignored.
    pub fn exterior_ring(&self) -> Result<Vec<[f64; 2]>> {
        if self.r#type != "Polygon" {
            return Err(AnomalyError::UnsupportedGeometry(self.r#type.clone()));
        }
        let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(self.coordinates.clone())?;
        let exterior = rings
            .into_iter()
            .next()
            .ok_or(AnomalyError::MissingGeometry)?;

        exterior
            .iter()
            .enumerate()
            .map(|(i, position)| parse_position(i, position))
            .collect()
    }
}

// A GeoJSON position is [lon, lat] with an optional altitude we do not use
fn parse_position(index: usize, position: &[f64]) -> Result<[f64; 2]> {
    if position.len() < 2 {
        return Err(AnomalyError::InvalidPosition(format!(
            "vertex {} has {} ordinates, expected at least 2",
            index,
            position.len()
        )));
    }
    let (lon, lat) = (position[0], position[1]);
    if !lon.is_finite() || !lat.is_finite() {
        return Err(AnomalyError::InvalidPosition(format!(
            "vertex {} is not finite",
            index
        )));
    }
    Ok([lon, lat])
}

/// Geometry of the first feature in a FeatureCollection document.
pub fn first_feature_geometry(geojson: &str) -> Result<GeometryData> {
    let collection: FeatureCollection = serde_json::from_str(geojson)?;
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(AnomalyError::MissingFeature)?;
    feature.geometry.ok_or(AnomalyError::MissingGeometry)
}
