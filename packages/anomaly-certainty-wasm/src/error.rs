use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised while loading the anomaly geometry or scoring a candidate.
///
/// Everything except `NonFinite`, `InvalidBatch` and `InvalidCandidate` is a
/// startup failure: without its reference geometry the scorer has no degraded
/// mode to fall back to.
#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error("failed to read anomaly source: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("anomaly source contains no features")]
    MissingFeature,

    #[error("first anomaly feature has no geometry")]
    MissingGeometry,

    #[error("unsupported anomaly geometry type '{0}', expected Polygon")]
    UnsupportedGeometry(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("anomaly polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("invalid scoring configuration: {0}")]
    DegenerateConfig(String),

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("invalid candidate batch: {0}")]
    InvalidBatch(String),

    #[error("candidate {index} rejected: {source}")]
    InvalidCandidate {
        index: usize,
        #[source]
        source: Box<AnomalyError>,
    },

    #[error("no anomaly loaded; call load_anomaly first")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, AnomalyError>;

impl From<AnomalyError> for JsValue {
    fn from(err: AnomalyError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Reject NaN and infinities before they reach the geometry kernel.
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnomalyError::NonFinite { field, value })
    }
}
