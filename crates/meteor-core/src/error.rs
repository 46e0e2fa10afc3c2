use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeteorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Video decode error: {0}")]
    Decode(String),

    #[error("ffmpeg executable not found on PATH")]
    FfmpegNotFound,

    #[error("Frame shape {found:?} does not match {expected:?}")]
    FrameShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("Trim failed: {0}")]
    TrimFailed(String),

    #[error("Trim timed out after {0} s")]
    TrimTimeout(u64),

    #[error("Invalid metric table: {0}")]
    MetricTable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pipeline degraded: {failed} of {total} frames failed (limit {max_ratio})")]
    PipelineDegraded {
        failed: usize,
        total: usize,
        max_ratio: f64,
    },

    #[error("Degenerate metric series: {0}")]
    DegenerateSeries(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, MeteorError>;

/// Why a single frame produced no metric. Recorded per frame, never fatal on
/// its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricFault {
    #[error("undefined metric: frame has zero dispersion")]
    Undefined,

    #[error("frame too small: {height}x{width}, need at least {min}x{min}")]
    FrameTooSmall {
        height: usize,
        width: usize,
        min: usize,
    },

    #[error("metric is not finite")]
    NonFinite,

    /// Slot left empty in a stored metric table; the cause is not recorded.
    #[error("no metric recorded in the metric table")]
    Unrecorded,
}
