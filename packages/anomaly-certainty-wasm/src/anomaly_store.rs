use std::fs;
use std::path::Path;

use geo::BoundingRect;
use geo_types::{Coord, Line, LineString};
use serde::Serialize;

use crate::config::ReferenceSegment;
use crate::console_log;
use crate::error::{AnomalyError, Result};
use crate::geojson_features::first_feature_geometry;

/// Axis-aligned extent of the anomaly polygon in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// The reference geometry every score is computed against: one anomaly ring and
/// one line segment. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyStore {
    polygon: Vec<Coord<f64>>,
    segment: Line<f64>,
    bounds: Bounds,
}

impl AnomalyStore {
    /// Build a store from an implicitly closed ring. A trailing vertex equal to the
    /// first is dropped before checking for the 3-vertex minimum.
    pub fn new(mut polygon: Vec<Coord<f64>>, segment: Line<f64>) -> Result<Self> {
        if polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        if polygon.len() < 3 {
            return Err(AnomalyError::TooFewVertices(polygon.len()));
        }
        if polygon.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(AnomalyError::InvalidPosition(
                "anomaly polygon contains a non-finite vertex".to_string(),
            ));
        }

        let bounds = LineString::from(polygon.clone())
            .bounding_rect()
            .map(|rect| Bounds {
                min_lng: rect.min().x,
                min_lat: rect.min().y,
                max_lng: rect.max().x,
                max_lat: rect.max().y,
            })
            .ok_or_else(|| {
                AnomalyError::InvalidPosition("anomaly polygon has no extent".to_string())
            })?;

        Ok(AnomalyStore {
            polygon,
            segment,
            bounds,
        })
    }

    /// Parse the first feature of a GeoJSON FeatureCollection as the anomaly polygon.
    pub fn from_geojson_str(geojson: &str, segment: ReferenceSegment) -> Result<Self> {
        let ring = first_feature_geometry(geojson)?.exterior_ring()?;
        let polygon = ring.into_iter().map(Coord::from).collect();
        let store = AnomalyStore::new(polygon, segment.to_line())?;
        console_log!(
            "Loaded anomaly polygon with {} vertices, bounds {:?}",
            store.vertex_count(),
            store.bounds
        );
        Ok(store)
    }

    pub fn from_path<P: AsRef<Path>>(path: P, segment: ReferenceSegment) -> Result<Self> {
        let geojson = fs::read_to_string(path.as_ref())?;
        Self::from_geojson_str(&geojson, segment)
    }

    pub fn polygon(&self) -> &[Coord<f64>] {
        &self.polygon
    }

    pub fn segment(&self) -> Line<f64> {
        self.segment
    }

    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}
