// GeoJSON export of the reference geometry for map collaborators
use serde_json::{json, Value};

use crate::anomaly_store::AnomalyStore;

/// FeatureCollection with the anomaly polygon and the reference segment, (lon, lat) order.
///
/// The ring is written closed, as GeoJSON requires, even though the store keeps
/// it open.
pub fn anomaly_overlay(store: &AnomalyStore) -> Value {
    let mut ring: Vec<[f64; 2]> = store.polygon().iter().map(|c| [c.x, c.y]).collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }

    let segment = store.segment();
    let bounds = store.bounds();

    json!({
        "type": "FeatureCollection",
        "bbox": [bounds.min_lng, bounds.min_lat, bounds.max_lng, bounds.max_lat],
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring]
                },
                "properties": { "role": "anomaly" }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [
                        [segment.start.x, segment.start.y],
                        [segment.end.x, segment.end.y]
                    ]
                },
                "properties": { "role": "reference_segment" }
            }
        ]
    })
}
