use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{AnomalyError, Result};
use crate::scorer::CertaintyScorer;

// Module state backing the wasm exports. The library API takes its scorer by
// value; only the JS surface needs a process-wide slot.
pub struct ModuleState {
    // Installed by load_anomaly, replaced wholesale on reload
    pub scorer: Option<Arc<CertaintyScorer>>,

    // Number of successful loads since start
    pub load_count: usize,
}

// Create a global static instance of the module state
lazy_static! {
    static ref MODULE_STATE: RwLock<ModuleState> = RwLock::new(ModuleState::new());
}

impl ModuleState {
    pub fn new() -> Self {
        ModuleState {
            scorer: None,
            load_count: 0,
        }
    }

    pub fn with_mut<F, R>(f: F) -> R
    where
        F: FnOnce(&mut ModuleState) -> R,
    {
        let mut guard = MODULE_STATE.write();
        f(&mut *guard)
    }

    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&ModuleState) -> R,
    {
        let guard = MODULE_STATE.read();
        f(&*guard)
    }

    pub fn install(&mut self, scorer: CertaintyScorer) -> Arc<CertaintyScorer> {
        let scorer = Arc::new(scorer);
        self.scorer = Some(Arc::clone(&scorer));
        self.load_count += 1;
        scorer
    }

    pub fn clear(&mut self) -> bool {
        self.scorer.take().is_some()
    }
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the installed scorer. The lock is released before scoring starts,
/// so a concurrent reload never blocks on an in-flight query.
pub fn current_scorer() -> Result<Arc<CertaintyScorer>> {
    ModuleState::with(|state| state.scorer.clone()).ok_or(AnomalyError::NotLoaded)
}
