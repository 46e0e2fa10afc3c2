use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_TRIM_TIMEOUT_SECS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// ffmpeg executable. `None` looks it up on PATH.
    pub ffmpeg: Option<PathBuf>,
    /// Wall-clock limit for one trimming process.
    pub timeout_secs: u64,
    /// Build a max-composite trail image for every clip.
    pub composite: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            timeout_secs: DEFAULT_TRIM_TIMEOUT_SECS,
            composite: true,
        }
    }
}
