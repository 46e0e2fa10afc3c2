use crate::aggregate::FrameFailure;
use crate::detect::DetectionResult;
use crate::extract::ExtractionReport;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Scanning,
    Persisting,
    Analyzing,
    Extracting,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanning => write!(f, "Scanning frames"),
            Self::Persisting => write!(f, "Writing metric table"),
            Self::Analyzing => write!(f, "Analyzing chunks"),
            Self::Extracting => write!(f, "Extracting clips"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// Work items completed so far within the current stage.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Reporter that ignores every update.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// End-of-run summary: every per-item failure with its index or range.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    /// Frames in the metric series.
    pub frames: usize,
    pub frame_failures: Vec<FrameFailure>,
    pub detections: Vec<DetectionResult>,
    /// Empty when extraction was skipped.
    pub extraction: ExtractionReport,
}

impl RunReport {
    pub fn triggered(&self) -> impl Iterator<Item = &DetectionResult> {
        self.detections.iter().filter(|d| d.triggered)
    }

    pub fn has_failures(&self) -> bool {
        !self.frame_failures.is_empty() || !self.extraction.failures.is_empty()
    }
}
