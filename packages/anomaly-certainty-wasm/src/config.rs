// Scoring constants and reference segment, deserialized from the JSON passed to load_anomaly.
use geo_types::{coord, Line};
use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, Result};

// Tunnel endpoints mapped during the 2025 survey, (lon, lat)
pub const DEFAULT_SEGMENT_START: [f64; 2] = [29.03456, 30.96920];
pub const DEFAULT_SEGMENT_END: [f64; 2] = [29.03380, 30.96850];

// Equatorial degree length; ignores the longitude compression at higher latitudes
pub const METERS_PER_DEGREE: f64 = 111_139.0;

/// Two (lon, lat) endpoints, serialized as `[[lon, lat], [lon, lat]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSegment(pub [f64; 2], pub [f64; 2]);

impl Default for ReferenceSegment {
    fn default() -> Self {
        ReferenceSegment(DEFAULT_SEGMENT_START, DEFAULT_SEGMENT_END)
    }
}

impl ReferenceSegment {
    pub fn to_line(&self) -> Line<f64> {
        Line::new(
            coord! { x: self.0[0], y: self.0[1] },
            coord! { x: self.1[0], y: self.1[1] },
        )
    }

    pub fn from_line(line: Line<f64>) -> Self {
        ReferenceSegment([line.start.x, line.start.y], [line.end.x, line.end.y])
    }

    fn validate(&self) -> Result<()> {
        let all = [self.0[0], self.0[1], self.1[0], self.1[1]];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::DegenerateConfig(
                "reference_segment endpoints must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Multiplicative scoring model. Defaults reproduce the Phase II survey calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub baseline: f64,
    pub depth_window_min_m: f64,
    pub depth_window_max_m: f64,
    pub depth_window_boost: f64,
    pub shallow_depth_limit_m: f64,
    pub shallow_penalty: f64,
    pub proximity_threshold_m: f64,
    pub proximity_boost: f64,
    pub meters_per_degree: f64,
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            baseline: 0.87,
            depth_window_min_m: 25.0,
            depth_window_max_m: 45.0,
            depth_window_boost: 1.15,
            shallow_depth_limit_m: 30.0,
            shallow_penalty: 0.85,
            proximity_threshold_m: 20.0,
            proximity_boost: 1.20,
            meters_per_degree: METERS_PER_DEGREE,
            max_score: 1.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("baseline", self.baseline),
            ("depth_window_min_m", self.depth_window_min_m),
            ("depth_window_max_m", self.depth_window_max_m),
            ("depth_window_boost", self.depth_window_boost),
            ("shallow_depth_limit_m", self.shallow_depth_limit_m),
            ("shallow_penalty", self.shallow_penalty),
            ("proximity_threshold_m", self.proximity_threshold_m),
            ("proximity_boost", self.proximity_boost),
            ("meters_per_degree", self.meters_per_degree),
            ("max_score", self.max_score),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnomalyError::DegenerateConfig(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        // Non-negative factors keep the score from dropping below zero
        let factors = [
            ("baseline", self.baseline),
            ("depth_window_boost", self.depth_window_boost),
            ("shallow_penalty", self.shallow_penalty),
            ("proximity_boost", self.proximity_boost),
        ];
        if let Some((name, value)) = factors.iter().find(|(_, v)| *v < 0.0) {
            return Err(AnomalyError::DegenerateConfig(format!(
                "{} must not be negative, got {}",
                name, value
            )));
        }

        if self.depth_window_min_m > self.depth_window_max_m {
            return Err(AnomalyError::DegenerateConfig(format!(
                "depth window [{}, {}] is empty",
                self.depth_window_min_m, self.depth_window_max_m
            )));
        }
        if self.meters_per_degree <= 0.0 {
            return Err(AnomalyError::DegenerateConfig(
                "meters_per_degree must be positive".to_string(),
            ));
        }
        if self.proximity_threshold_m < 0.0 {
            return Err(AnomalyError::DegenerateConfig(
                "proximity_threshold_m must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_score) {
            return Err(AnomalyError::DegenerateConfig(format!(
                "max_score must lie in [0, 1], got {}",
                self.max_score
            )));
        }
        Ok(())
    }

    pub fn depth_in_window(&self, depth: f64) -> bool {
        self.depth_window_min_m <= depth && depth <= self.depth_window_max_m
    }

    pub fn degrees_to_meters(&self, degrees: f64) -> f64 {
        degrees * self.meters_per_degree
    }
}

/// Everything `load_anomaly` accepts next to the polygon source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default)]
    pub reference_segment: ReferenceSegment,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl AnomalyConfig {
    /// Parse a config document. An empty or whitespace-only string yields the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(AnomalyConfig::default());
        }
        let config: AnomalyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.reference_segment.validate()?;
        self.scoring.validate()
    }
}
