//! Concurrent metric scan.
//!
//! A reader thread tags frames with their position and feeds a bounded
//! channel; a dedicated rayon pool computes metrics; a single collector
//! inserts each `(index, outcome)` into the series. Completion order never
//! affects the result.

pub mod config;

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::error::{MeteorError, MetricFault, Result};
use crate::frame::Frame;
use crate::metric;
use crate::pipeline::{NoOpReporter, PipelineStage, ProgressReporter};
use crate::series::MetricSeries;

pub use config::ScanConfig;

/// A frame whose metric could not be computed.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameFailure {
    pub index: usize,
    pub fault: MetricFault,
}

/// Everything the scan phase produces.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub series: MetricSeries,
    /// Sorted by frame index.
    pub failures: Vec<FrameFailure>,
}

impl ScanOutput {
    pub fn frames(&self) -> usize {
        self.series.len()
    }
}

/// Drives the metric over every frame of a source on a bounded worker pool.
pub struct Aggregator {
    config: ScanConfig,
    reporter: Arc<dyn ProgressReporter>,
    expected_frames: Option<usize>,
}

impl Aggregator {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(NoOpReporter),
            expected_frames: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Frame count hint for progress reporting only.
    pub fn expected_frames(mut self, frames: Option<usize>) -> Self {
        self.expected_frames = frames;
        self
    }

    /// Scan `frames` with the contrast metric.
    pub fn run<I>(&self, frames: I) -> Result<ScanOutput>
    where
        I: IntoIterator<Item = Result<Frame>>,
        I::IntoIter: Send,
    {
        self.run_with(frames, metric::compute)
    }

    /// Scan `frames` with an arbitrary per-frame metric.
    ///
    /// A frame read error aborts the scan. Metric faults are recorded per
    /// frame; the scan only fails if they exceed `max_failure_ratio`.
    pub fn run_with<I, F>(&self, frames: I, metric_fn: F) -> Result<ScanOutput>
    where
        I: IntoIterator<Item = Result<Frame>>,
        I::IntoIter: Send,
        F: Fn(&Frame) -> std::result::Result<f64, MetricFault> + Sync,
    {
        let workers = self.config.resolved_workers();
        let max_pending = self.config.resolved_max_pending(workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("meteor-metric-{i}"))
            .build()?;

        info!(workers, max_pending, "Scanning frames");
        self.reporter
            .begin_stage(PipelineStage::Scanning, self.expected_frames);

        let frames = frames.into_iter();
        let (frame_tx, frame_rx) = mpsc::sync_channel::<(usize, Frame)>(max_pending);
        let (result_tx, result_rx) = mpsc::channel::<(usize, std::result::Result<f64, MetricFault>)>();
        let metric_fn = &metric_fn;
        let pool = &pool;

        let (submitted, collector) = thread::scope(|scope| {
            let reader = scope.spawn(move || -> Result<usize> {
                let mut submitted = 0;
                for (index, frame) in frames.enumerate() {
                    // Blocks while `max_pending` frames wait for a worker.
                    if frame_tx.send((index, frame?)).is_err() {
                        break;
                    }
                    submitted += 1;
                }
                Ok(submitted)
            });

            scope.spawn(move || {
                pool.install(|| {
                    frame_rx
                        .into_iter()
                        .par_bridge()
                        .for_each_with(result_tx, |tx, (index, frame)| {
                            let outcome = metric_fn(&frame);
                            drop(frame);
                            // The collector outlives every worker.
                            let _ = tx.send((index, outcome));
                        });
                });
            });

            let mut collector = Collector::default();
            for (index, outcome) in result_rx {
                collector.record(index, outcome);
                self.reporter.advance(collector.received);
            }

            let submitted = reader
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (submitted, collector)
        });
        self.reporter.finish_stage();

        let submitted = submitted?;
        debug_assert_eq!(collector.received, submitted);
        collector.finish(submitted, self.config.max_failure_ratio)
    }
}

/// Single writer of the series while the scan runs.
#[derive(Default)]
struct Collector {
    series: MetricSeries,
    failures: Vec<FrameFailure>,
    received: usize,
}

impl Collector {
    fn record(&mut self, index: usize, outcome: std::result::Result<f64, MetricFault>) {
        self.received += 1;
        match outcome {
            Ok(value) => self.series.insert(index, Some(value)),
            Err(fault) => {
                debug!(index, %fault, "Frame metric failed");
                self.series.insert(index, None);
                self.failures.push(FrameFailure { index, fault });
            }
        }
    }

    fn finish(mut self, submitted: usize, max_failure_ratio: f64) -> Result<ScanOutput> {
        if submitted == 0 {
            return Err(MeteorError::EmptySequence);
        }
        self.failures.sort_by_key(|f| f.index);

        let failed = self.failures.len();
        if failed > 0 {
            warn!(failed, total = submitted, "Some frames produced no metric");
        }
        if failed as f64 / submitted as f64 > max_failure_ratio {
            return Err(MeteorError::PipelineDegraded {
                failed,
                total: submitted,
                max_ratio: max_failure_ratio,
            });
        }

        info!(frames = submitted, failed, "Scan complete");
        Ok(ScanOutput {
            series: self.series,
            failures: self.failures,
        })
    }
}
