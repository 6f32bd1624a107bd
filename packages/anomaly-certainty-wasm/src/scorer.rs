use geo_types::coord;
use serde::{Deserialize, Serialize};

use crate::anomaly_store::AnomalyStore;
use crate::config::ScoringConfig;
use crate::error::{ensure_finite, AnomalyError, Result};
use crate::geometry::{distance_point_to_segment, point_in_polygon};

/// A candidate excavation target. Depth is meters below ground surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub lon: f64,
    pub lat: f64,
    pub depth: f64,
}

impl QueryPoint {
    pub fn new(lon: f64, lat: f64, depth: f64) -> Self {
        QueryPoint { lon, lat, depth }
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("lon", self.lon)?;
        ensure_finite("lat", self.lat)?;
        ensure_finite("depth", self.depth)?;
        Ok(())
    }
}

/// Every decision that went into a score, for annotating candidates on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertaintyBreakdown {
    pub score: f64,
    pub unclamped_score: f64,
    pub inside_polygon: bool,
    pub depth_window_boost_applied: bool,
    pub shallow_penalty_applied: bool,
    pub distance_to_segment_m: f64,
    pub proximity_boost_applied: bool,
}

/// Scores candidates against one anomaly. Holds no mutable state, so a single
/// instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct CertaintyScorer {
    store: AnomalyStore,
    config: ScoringConfig,
}

impl CertaintyScorer {
    pub fn new(store: AnomalyStore, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(CertaintyScorer { store, config })
    }

    pub fn with_defaults(store: AnomalyStore) -> Self {
        CertaintyScorer {
            store,
            config: ScoringConfig::default(),
        }
    }

    pub fn store(&self) -> &AnomalyStore {
        &self.store
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Certainty in [0, max_score] that (lon, lat, depth) falls on the anomaly.
    pub fn compute_certainty(&self, lon: f64, lat: f64, depth: f64) -> Result<f64> {
        self.explain_certainty(lon, lat, depth).map(|b| b.score)
    }

    pub fn explain_certainty(&self, lon: f64, lat: f64, depth: f64) -> Result<CertaintyBreakdown> {
        let point = QueryPoint::new(lon, lat, depth);
        point.validate()?;
        Ok(self.breakdown(&point))
    }

    // Adjustments are applied in a fixed order to a running product
    fn breakdown(&self, point: &QueryPoint) -> CertaintyBreakdown {
        let cfg = &self.config;
        let position = coord! { x: point.lon, y: point.lat };
        let mut score = cfg.baseline;

        let inside_polygon = point_in_polygon(position, self.store.polygon());

        let depth_window_boost_applied = inside_polygon && cfg.depth_in_window(point.depth);
        if depth_window_boost_applied {
            score *= cfg.depth_window_boost;
        }

        // Independent of the window boost, both can apply
        let shallow_penalty_applied = point.depth <= cfg.shallow_depth_limit_m;
        if shallow_penalty_applied {
            score *= cfg.shallow_penalty;
        }

        let segment = self.store.segment();
        let distance_to_segment_m =
            cfg.degrees_to_meters(distance_point_to_segment(position, segment.start, segment.end));
        let proximity_boost_applied = distance_to_segment_m < cfg.proximity_threshold_m;
        if proximity_boost_applied {
            score *= cfg.proximity_boost;
        }

        CertaintyBreakdown {
            score: score.min(cfg.max_score),
            unclamped_score: score,
            inside_polygon,
            depth_window_boost_applied,
            shallow_penalty_applied,
            distance_to_segment_m,
            proximity_boost_applied,
        }
    }

    /// Score every point, stopping at the first one that fails validation.
    pub fn score_batch(&self, points: &[QueryPoint]) -> Result<Vec<f64>> {
        points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                point
                    .validate()
                    .map(|_| self.breakdown(point).score)
                    .map_err(|e| AnomalyError::InvalidCandidate {
                        index,
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    /// (index, score) of every candidate scoring at least `threshold`, in input order.
    pub fn filter_candidates(&self, points: &[QueryPoint], threshold: f64) -> Result<Vec<(usize, f64)>> {
        let threshold = ensure_finite("threshold", threshold)?;
        let scores = self.score_batch(points)?;
        Ok(scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score >= threshold)
            .collect())
    }
}

/// Split a flat `[lon, lat, depth, lon, lat, depth, ...]` buffer into query points.
pub fn query_points_from_flat(coords: &[f64]) -> Result<Vec<QueryPoint>> {
    if coords.len() % 3 != 0 {
        return Err(AnomalyError::InvalidBatch(format!(
            "expected lon/lat/depth triples, got {} values",
            coords.len()
        )));
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| QueryPoint::new(c[0], c[1], c[2]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceSegment;

    fn square_store(segment: ReferenceSegment) -> AnomalyStore {
        AnomalyStore::new(
            vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 0.01, y: 0.0 },
                coord! { x: 0.01, y: 0.01 },
                coord! { x: 0.0, y: 0.01 },
            ],
            segment.to_line(),
        )
        .unwrap()
    }

    // Segment along the bottom edge of the square
    fn scorer() -> CertaintyScorer {
        CertaintyScorer::with_defaults(square_store(ReferenceSegment([0.0, 0.0], [0.01, 0.0])))
    }

    #[test]
    fn breakdown_reports_each_adjustment() {
        // 0.005 degrees north of the segment is ~556 m away
        let b = scorer().explain_certainty(0.005, 0.005, 28.0).unwrap();
        assert!(b.inside_polygon);
        assert!(b.depth_window_boost_applied);
        assert!(b.shallow_penalty_applied);
        assert!(!b.proximity_boost_applied);
        assert!((b.distance_to_segment_m - 0.005 * 111_139.0).abs() < 1e-6);
        assert!((b.unclamped_score - 0.87 * 1.15 * 0.85).abs() < 1e-12);
        assert_eq!(b.score, b.unclamped_score);
    }

    #[test]
    fn proximity_boost_switches_at_threshold() {
        let s = scorer();
        // 20 m north of the bottom edge, inside the square
        let lat = 20.0 / 111_139.0;
        let b = s.explain_certainty(0.005, lat, 50.0).unwrap();
        assert!((b.distance_to_segment_m - 20.0).abs() < 1e-9);

        let b = s.explain_certainty(0.005, lat * 0.99, 50.0).unwrap();
        assert!(b.proximity_boost_applied);
        assert!((b.unclamped_score - 0.87 * 1.2).abs() < 1e-12);
        assert_eq!(b.score, 1.0);

        let b = s.explain_certainty(0.005, lat * 1.01, 50.0).unwrap();
        assert!(!b.proximity_boost_applied);
    }

    #[test]
    fn shallow_penalty_applies_outside_polygon() {
        let s = scorer();
        let b = s.explain_certainty(1.0, 1.0, 10.0).unwrap();
        assert!(!b.inside_polygon);
        assert!(b.shallow_penalty_applied);
        assert!((b.score - 0.87 * 0.85).abs() < 1e-12);
    }

    #[test]
    fn window_boost_requires_containment() {
        let b = scorer().explain_certainty(1.0, 1.0, 35.0).unwrap();
        assert!(!b.depth_window_boost_applied);
        assert_eq!(b.score, 0.87);
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let s = scorer();
        for (lon, lat, depth, field) in [
            (f64::NAN, 0.0, 30.0, "lon"),
            (0.0, f64::INFINITY, 30.0, "lat"),
            (0.0, 0.0, f64::NAN, "depth"),
        ] {
            match s.compute_certainty(lon, lat, depth) {
                Err(AnomalyError::NonFinite { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected NonFinite for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn custom_config_changes_the_model() {
        let config = ScoringConfig {
            baseline: 0.5,
            max_score: 0.6,
            ..ScoringConfig::default()
        };
        let s = CertaintyScorer::new(square_store(ReferenceSegment::default()), config).unwrap();
        assert_eq!(s.compute_certainty(0.005, 0.005, 50.0).unwrap(), 0.5);
        // 0.5 * 1.15 * 1.2 would be 0.69
        let s = CertaintyScorer::new(
            square_store(ReferenceSegment([0.0, 0.005], [0.01, 0.005])),
            s.config().clone(),
        )
        .unwrap();
        assert_eq!(s.compute_certainty(0.005, 0.005, 35.0).unwrap(), 0.6);
    }

    #[test]
    fn score_cap_above_one_is_rejected_at_construction() {
        let config = ScoringConfig {
            max_score: 2.0,
            ..ScoringConfig::default()
        };
        let segment = ReferenceSegment([0.0, 0.0], [0.01, 0.0]);
        assert!(matches!(
            CertaintyScorer::new(square_store(segment), config),
            Err(AnomalyError::DegenerateConfig(_))
        ));

        // Boosts that would reach 1.2006 stay capped at 1.0 with the default cap
        assert_eq!(scorer().compute_certainty(0.005, 0.0001, 35.0).unwrap(), 1.0);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = ScoringConfig {
            meters_per_degree: -1.0,
            ..ScoringConfig::default()
        };
        assert!(CertaintyScorer::new(square_store(ReferenceSegment::default()), config).is_err());
    }

    #[test]
    fn batch_error_names_the_candidate() {
        let points = [
            QueryPoint::new(0.005, 0.005, 35.0),
            QueryPoint::new(0.005, 0.005, f64::NAN),
        ];
        match scorer().score_batch(&points) {
            Err(AnomalyError::InvalidCandidate { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, AnomalyError::NonFinite { field: "depth", .. }));
            }
            other => panic!("expected InvalidCandidate, got {:?}", other),
        }
    }

    #[test]
    fn filter_keeps_input_order_and_threshold_is_inclusive() {
        let points = [
            QueryPoint::new(1.0, 1.0, 35.0),     // 0.87
            QueryPoint::new(0.005, 0.005, 20.0), // 0.7395
            QueryPoint::new(0.005, 0.005, 35.0), // 1.0
        ];
        let kept = scorer().filter_candidates(&points, 0.87).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], (0, 0.87));
        assert_eq!(kept[1].0, 2);
        assert_eq!(kept[1].1, 1.0);
    }

    #[test]
    fn flat_buffer_must_hold_triples() {
        let points = query_points_from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(points, vec![QueryPoint::new(1.0, 2.0, 3.0), QueryPoint::new(4.0, 5.0, 6.0)]);
        assert!(matches!(
            query_points_from_flat(&[1.0, 2.0]).unwrap_err(),
            AnomalyError::InvalidBatch(_)
        ));
        assert!(query_points_from_flat(&[]).unwrap().is_empty());
    }
}
