use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::ScanConfig;
use crate::consts::DEFAULT_METRIC_TABLE;
use crate::detect::DetectionConfig;
use crate::error::{MeteorError, Result};
use crate::extract::ExtractionConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeteorConfig {
    /// Recording to scan and cut clips from.
    pub input: PathBuf,
    /// Gzip CSV hand-off between the scan and detection passes.
    #[serde(default = "default_metric_table")]
    pub metric_table: PathBuf,
    /// Where clips and composites are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

fn default_metric_table() -> PathBuf {
    PathBuf::from(DEFAULT_METRIC_TABLE)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl MeteorConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            metric_table: default_metric_table(),
            output_dir: default_output_dir(),
            scan: ScanConfig::default(),
            detection: DetectionConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MeteorError::InvalidConfig(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MeteorError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            return Err(MeteorError::InvalidConfig("input path is empty".into()));
        }
        if self.metric_table.as_os_str().is_empty() {
            return Err(MeteorError::InvalidConfig(
                "metric table path is empty".into(),
            ));
        }
        let ratio = self.scan.max_failure_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(MeteorError::InvalidConfig(format!(
                "max_failure_ratio must be within 0..=1, got {ratio}"
            )));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(MeteorError::InvalidConfig(
                "extraction timeout must be > 0".into(),
            ));
        }
        self.detection.validate()
    }
}
