// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};

use crate::anomaly_store::Bounds;
use crate::config::{ReferenceSegment, ScoringConfig};

#[derive(Serialize)]
pub struct AnomalyInfo {
    pub vertex_count: usize,
    pub bounds: Bounds,
    pub reference_segment: ReferenceSegment,
    pub scoring: ScoringConfig,
    pub load_count: usize,
}

// One candidate that passed filter_candidates
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct RankedCandidate {
    pub index: usize,
    pub score: f64,
}
