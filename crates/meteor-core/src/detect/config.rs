use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CHUNK_SIZE, DEFAULT_FIXED_SENSITIVITY, DEFAULT_FPS, DEFAULT_NORMALIZED_SENSITIVITY,
    DEFAULT_WINDOW,
};
use crate::error::{MeteorError, Result};

/// How the detection threshold is derived from the series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// `mean + alpha * std` over the raw series.
    Fixed,
    /// Divide the series by its maximum, then `mean + alpha * std`.
    #[default]
    MaxNormalized,
}

impl ThresholdPolicy {
    pub fn default_sensitivity(&self) -> f64 {
        match self {
            Self::Fixed => DEFAULT_FIXED_SENSITIVITY,
            Self::MaxNormalized => DEFAULT_NORMALIZED_SENSITIVITY,
        }
    }
}

impl std::fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "Fixed"),
            Self::MaxNormalized => write!(f, "Max-normalized"),
        }
    }
}

/// When a chunk counts as an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerRule {
    /// At least `fps` sustained windows on the fitted curve (one second of
    /// cumulative signal).
    #[default]
    Sustained,
    /// Any raw sample of the chunk at or above the threshold.
    Peak,
}

impl std::fmt::Display for TriggerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sustained => write!(f, "Sustained"),
            Self::Peak => write!(f, "Peak"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Frame rate of the recording.
    pub fps: f64,
    /// Frames per analysis chunk.
    pub chunk_size: usize,
    /// Sliding window length in fitted samples.
    pub window: usize,
    /// Alpha in `mean + alpha * std`. `None` picks the policy's default.
    pub sensitivity: Option<f64>,
    pub policy: ThresholdPolicy,
    pub trigger: TriggerRule,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            window: DEFAULT_WINDOW,
            sensitivity: None,
            policy: ThresholdPolicy::default(),
            trigger: TriggerRule::default(),
        }
    }
}

impl DetectionConfig {
    pub fn resolved_sensitivity(&self) -> f64 {
        self.sensitivity
            .unwrap_or_else(|| self.policy.default_sensitivity())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(MeteorError::InvalidConfig(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if self.chunk_size == 0 {
            return Err(MeteorError::InvalidConfig("chunk_size must be > 0".into()));
        }
        if self.window == 0 {
            return Err(MeteorError::InvalidConfig("window must be > 0".into()));
        }
        if !self.resolved_sensitivity().is_finite() {
            return Err(MeteorError::InvalidConfig(
                "sensitivity must be finite".into(),
            ));
        }
        Ok(())
    }
}
