//! Second pass: cut a subclip for every triggered chunk and composite its
//! frames into a trail image.

pub mod composite;
pub mod config;
pub mod trim;

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::consts::{COMPOSITE_EXTENSION, DEFAULT_CLIP_EXTENSION};
use crate::detect::DetectionResult;
use crate::error::Result;
use crate::io::source::open_source;
use crate::pipeline::{NoOpReporter, PipelineStage, ProgressReporter};

pub use composite::{composite_source, Composite};
pub use config::ExtractionConfig;
pub use trim::{trimmer_for, FfmpegTrimmer, SerTrimmer, TrimRequest, Trimmer};

/// A subclip written to disk.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    pub path: PathBuf,
    pub frames: Range<usize>,
    pub start_time: f64,
    pub end_time: f64,
    /// Trail image, when compositing succeeded.
    pub composite: Option<PathBuf>,
}

/// Which step of a clip failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipStage {
    Trim,
    Composite,
}

impl std::fmt::Display for ClipStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trim => write!(f, "trim"),
            Self::Composite => write!(f, "composite"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipFailure {
    pub frames: Range<usize>,
    pub stage: ClipStage,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractionReport {
    pub clips: Vec<Clip>,
    pub failures: Vec<ClipFailure>,
}

/// Deterministic clip name: `subclip_<start>_<end>.<ext>`, with the input's
/// extension so stream copy keeps a compatible container.
pub fn clip_path(output_dir: &Path, input: &Path, frames: &Range<usize>) -> PathBuf {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_CLIP_EXTENSION);
    output_dir.join(format!("subclip_{}_{}.{ext}", frames.start, frames.end))
}

pub struct ClipExtractor {
    config: ExtractionConfig,
    trimmer: Box<dyn Trimmer>,
    reporter: Arc<dyn ProgressReporter>,
}

impl ClipExtractor {
    pub fn new(config: ExtractionConfig, trimmer: Box<dyn Trimmer>) -> Self {
        Self {
            config,
            trimmer,
            reporter: Arc::new(NoOpReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Cut and composite every triggered result, one clip at a time.
    ///
    /// Per-clip failures land in the report; only an unusable output
    /// directory is an error.
    pub fn extract(
        &self,
        results: &[DetectionResult],
        input: &Path,
        output_dir: &Path,
        fps: f64,
    ) -> Result<ExtractionReport> {
        std::fs::create_dir_all(output_dir)?;

        let triggered: Vec<&DetectionResult> = results.iter().filter(|r| r.triggered).collect();
        info!(
            clips = triggered.len(),
            trimmer = self.trimmer.name(),
            "Extracting clips"
        );
        self.reporter
            .begin_stage(PipelineStage::Extracting, Some(triggered.len()));

        let mut report = ExtractionReport::default();
        for (done, result) in triggered.into_iter().enumerate() {
            let request = TrimRequest {
                input: input.to_path_buf(),
                output: clip_path(output_dir, input, &result.range()),
                frames: result.range(),
                start_time: result.start_time(fps),
                duration: result.end_time(fps) - result.start_time(fps),
            };

            if let Err(e) = self.trimmer.trim(&request) {
                warn!(frames = ?request.frames, error = %e, "Clip trim failed");
                report.failures.push(ClipFailure {
                    frames: request.frames,
                    stage: ClipStage::Trim,
                    reason: e.to_string(),
                });
                self.reporter.advance(done + 1);
                continue;
            }

            let mut clip = Clip {
                path: request.output.clone(),
                frames: request.frames.clone(),
                start_time: request.start_time,
                end_time: request.start_time + request.duration,
                composite: None,
            };

            if self.config.composite {
                let image_path = clip.path.with_extension(COMPOSITE_EXTENSION);
                match composite_clip(&clip.path, &image_path) {
                    Ok(()) => clip.composite = Some(image_path),
                    Err(e) => {
                        warn!(clip = %clip.path.display(), error = %e, "Composite failed");
                        report.failures.push(ClipFailure {
                            frames: clip.frames.clone(),
                            stage: ClipStage::Composite,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            info!(clip = %clip.path.display(), "Clip written");
            report.clips.push(clip);
            self.reporter.advance(done + 1);
        }
        self.reporter.finish_stage();

        Ok(report)
    }
}

/// Decode `clip` and write its max composite to `image_path`.
pub fn composite_clip(clip: &Path, image_path: &Path) -> Result<()> {
    let mut source = open_source(clip)?;
    let composite = composite_source(source.as_mut());
    source.close()?;
    composite?.save(image_path)
}
