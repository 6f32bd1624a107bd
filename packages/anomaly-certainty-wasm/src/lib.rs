use js_sys::Float64Array;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
// Typed errors shared by every module
pub mod error;
// Ray casting and segment distance
pub mod geometry;
// GeoJSON shapes for the anomaly source
pub mod geojson_features;
// Scoring constants and reference segment
pub mod config;
// Reference geometry loaded at startup
pub mod anomaly_store;
// Multiplicative certainty model
pub mod scorer;
// GeoJSON export for map overlays
pub mod overlay;
// Serializable responses for the JS side
pub mod models;
// Global slot for the scorer used by the wasm exports
mod module_state;

pub use anomaly_store::{AnomalyStore, Bounds};
pub use config::{AnomalyConfig, ReferenceSegment, ScoringConfig};
pub use error::AnomalyError;
pub use scorer::{CertaintyBreakdown, CertaintyScorer, QueryPoint};

use models::{AnomalyInfo, RankedCandidate};
use module_state::{current_scorer, ModuleState};
use scorer::query_points_from_flat;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macros from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => (crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("Anomaly certainty module initialized");
    });
}

// Log a rejected request before handing the error to JS
fn reject(context: &str, err: AnomalyError) -> JsValue {
    console_warn!("{} failed: {}", context, err);
    JsValue::from(err)
}

/// Parse the anomaly GeoJSON and optional config JSON, then install the scorer
/// used by every other export. Replaces any previously loaded anomaly.
#[wasm_bindgen]
pub fn load_anomaly(geojson: &str, config_json: &str) -> Result<JsValue, JsValue> {
    let config = AnomalyConfig::from_json_str(config_json).map_err(|e| reject("load_anomaly", e))?;
    let store = AnomalyStore::from_geojson_str(geojson, config.reference_segment)
        .map_err(|e| reject("load_anomaly", e))?;
    let scorer =
        CertaintyScorer::new(store, config.scoring).map_err(|e| reject("load_anomaly", e))?;

    let info = ModuleState::with_mut(|state| {
        let scorer = state.install(scorer);
        anomaly_info(&scorer, state.load_count)
    });
    Ok(to_value(&info)?)
}

fn anomaly_info(scorer: &CertaintyScorer, load_count: usize) -> AnomalyInfo {
    let store = scorer.store();
    AnomalyInfo {
        vertex_count: store.vertex_count(),
        bounds: store.bounds(),
        reference_segment: ReferenceSegment::from_line(store.segment()),
        scoring: scorer.config().clone(),
        load_count,
    }
}

#[wasm_bindgen]
pub fn is_anomaly_loaded() -> bool {
    ModuleState::with(|state| state.scorer.is_some())
}

#[wasm_bindgen]
pub fn clear_anomaly() -> bool {
    ModuleState::with_mut(|state| state.clear())
}

/// Summary of the loaded anomaly: vertex count, bounds, segment and scoring constants.
#[wasm_bindgen]
pub fn get_anomaly_info() -> Result<JsValue, JsValue> {
    let (scorer, load_count) = ModuleState::with(|state| (state.scorer.clone(), state.load_count));
    let scorer = scorer.ok_or_else(|| reject("get_anomaly_info", AnomalyError::NotLoaded))?;
    Ok(to_value(&anomaly_info(&scorer, load_count))?)
}

#[wasm_bindgen]
pub fn compute_certainty(lon: f64, lat: f64, depth: f64) -> Result<f64, JsValue> {
    let scorer = current_scorer().map_err(|e| reject("compute_certainty", e))?;
    scorer
        .compute_certainty(lon, lat, depth)
        .map_err(|e| reject("compute_certainty", e))
}

#[wasm_bindgen]
pub fn explain_certainty(lon: f64, lat: f64, depth: f64) -> Result<JsValue, JsValue> {
    let scorer = current_scorer().map_err(|e| reject("explain_certainty", e))?;
    let breakdown = scorer
        .explain_certainty(lon, lat, depth)
        .map_err(|e| reject("explain_certainty", e))?;
    Ok(to_value(&breakdown)?)
}

/// Score a flat `[lon, lat, depth, ...]` buffer. Returns one score per triple.
#[wasm_bindgen]
pub fn score_candidates(coords: &[f64]) -> Result<Float64Array, JsValue> {
    let scorer = current_scorer().map_err(|e| reject("score_candidates", e))?;
    let points = query_points_from_flat(coords).map_err(|e| reject("score_candidates", e))?;
    let scores = scorer
        .score_batch(&points)
        .map_err(|e| reject("score_candidates", e))?;

    console_log!("Scored {} candidates", scores.len());
    Ok(Float64Array::from(scores.as_slice()))
}

/// Candidates from a flat `[lon, lat, depth, ...]` buffer scoring at least `threshold`,
/// as `[{ index, score }]` in input order.
#[wasm_bindgen]
pub fn filter_candidates(coords: &[f64], threshold: f64) -> Result<JsValue, JsValue> {
    let scorer = current_scorer().map_err(|e| reject("filter_candidates", e))?;
    let points =
        query_points_from_flat(coords).map_err(|e| reject("filter_candidates", e))?;
    let kept: Vec<RankedCandidate> = scorer
        .filter_candidates(&points, threshold)
        .map_err(|e| reject("filter_candidates", e))?
        .into_iter()
        .map(|(index, score)| RankedCandidate { index, score })
        .collect();

    console_log!("{} of {} candidates at or above {}", kept.len(), points.len(), threshold);
    Ok(to_value(&kept)?)
}

/// The loaded polygon and reference segment as a GeoJSON FeatureCollection string.
#[wasm_bindgen]
pub fn anomaly_overlay_geojson() -> Result<String, JsValue> {
    let scorer = current_scorer().map_err(|e| reject("anomaly_overlay_geojson", e))?;
    serde_json::to_string(&overlay::anomaly_overlay(scorer.store()))
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize overlay: {}", e)))
}

/// Default configuration document, for callers that want to edit a copy.
#[wasm_bindgen]
pub fn default_config_json() -> String {
    serde_json::to_string_pretty(&AnomalyConfig::default()).unwrap_or_else(|_| "{}".to_string())
}
