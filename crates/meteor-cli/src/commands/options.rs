use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use meteor_core::aggregate::ScanConfig;
use meteor_core::consts::{
    DEFAULT_CHUNK_SIZE, DEFAULT_FPS, DEFAULT_MAX_FAILURE_RATIO, DEFAULT_TRIM_TIMEOUT_SECS,
    DEFAULT_WINDOW,
};
use meteor_core::detect::{DetectionConfig, ThresholdPolicy, TriggerRule};
use meteor_core::extract::ExtractionConfig;
use meteor_core::pipeline::MeteorConfig;
use tracing::debug;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    /// mean + alpha * std over the raw series (alpha defaults to 3.7)
    Fixed,
    /// Divide by the series maximum first (alpha defaults to 1.0)
    MaxNormalized,
}

impl From<PolicyArg> for ThresholdPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fixed => ThresholdPolicy::Fixed,
            PolicyArg::MaxNormalized => ThresholdPolicy::MaxNormalized,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TriggerArg {
    /// At least fps sustained windows above threshold
    Sustained,
    /// Any raw value of the chunk at or above threshold
    Peak,
}

impl From<TriggerArg> for TriggerRule {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Sustained => TriggerRule::Sustained,
            TriggerArg::Peak => TriggerRule::Peak,
        }
    }
}

#[derive(Args, Clone)]
pub struct ScanOptions {
    /// Worker threads (default: one per CPU)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Decoded frames allowed to queue ahead of the workers
    #[arg(long)]
    pub max_pending: Option<usize>,

    /// Fraction of frames allowed to fail before the scan aborts
    #[arg(long, default_value_t = DEFAULT_MAX_FAILURE_RATIO)]
    pub max_failure_ratio: f64,
}

impl ScanOptions {
    pub fn to_config(&self) -> ScanConfig {
        ScanConfig {
            workers: self.workers,
            max_pending: self.max_pending,
            max_failure_ratio: self.max_failure_ratio,
        }
    }
}

#[derive(Args, Clone)]
pub struct DetectionOptions {
    /// Frames per second of the recording
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: f64,

    /// Frames per analysis chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk: usize,

    /// Threshold sensitivity alpha (default depends on --policy)
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Threshold policy
    #[arg(long, value_enum, default_value = "max-normalized")]
    pub policy: PolicyArg,

    /// Sliding window length in fitted samples
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Rule deciding when a chunk counts as an event
    #[arg(long, value_enum, default_value = "sustained")]
    pub trigger: TriggerArg,
}

impl DetectionOptions {
    pub fn to_config(&self) -> DetectionConfig {
        DetectionConfig {
            fps: self.fps,
            chunk_size: self.chunk,
            window: self.window,
            sensitivity: self.alpha,
            policy: self.policy.into(),
            trigger: self.trigger.into(),
        }
    }
}

#[derive(Args, Clone)]
pub struct ExtractionOptions {
    /// Directory for clips and composites
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Report detections without cutting clips
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the trail composite of each clip
    #[arg(long)]
    pub no_composite: bool,

    /// Seconds before a trimming process is killed
    #[arg(long, default_value_t = DEFAULT_TRIM_TIMEOUT_SECS)]
    pub timeout: u64,

    /// ffmpeg executable (default: looked up on PATH)
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,
}

impl ExtractionOptions {
    pub fn to_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            ffmpeg: self.ffmpeg.clone(),
            timeout_secs: self.timeout,
            composite: !self.no_composite,
        }
    }
}

/// Start from `--config` when given, otherwise from defaults. The input path
/// and an explicitly passed table or output directory always win.
pub fn base_config(
    config_path: Option<&Path>,
    input: &Path,
    table: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<(MeteorConfig, bool)> {
    let (mut config, from_file) = match config_path {
        Some(path) => {
            let config = MeteorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            (config, true)
        }
        None => (MeteorConfig::new(input), false),
    };
    config.input = input.to_path_buf();
    if let Some(table) = table {
        config.metric_table = table.to_path_buf();
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir.to_path_buf();
    }
    debug!(from_file, ?config, "Base configuration");
    Ok((config, from_file))
}
