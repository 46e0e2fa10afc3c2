use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_FAILURE_RATIO, PENDING_FRAMES_PER_WORKER};

/// Settings for the metric scan over all frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Worker threads. `None` uses one per available execution unit.
    pub workers: Option<usize>,
    /// Frames decoded but not yet picked up by a worker. `None` uses two per
    /// worker. The reader blocks once this many are queued.
    pub max_pending: Option<usize>,
    /// Fraction of frames allowed to fail before the scan aborts.
    pub max_failure_ratio: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: None,
            max_pending: None,
            max_failure_ratio: DEFAULT_MAX_FAILURE_RATIO,
        }
    }
}

impl ScanConfig {
    pub fn resolved_workers(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }

    pub fn resolved_max_pending(&self, workers: usize) -> usize {
        self.max_pending
            .filter(|&n| n > 0)
            .unwrap_or(workers * PENDING_FRAMES_PER_WORKER)
    }
}
