//! Chunked detection over a metric series.
//!
//! The series is cut into fixed-size chunks. Each chunk is smoothed with a
//! degree-7 least-squares polynomial and scanned with a sliding window for
//! runs where the fitted curve stays at or above a global threshold.

pub mod config;
pub mod polyfit;
pub mod threshold;

use std::ops::Range;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::consts::POLYNOMIAL_DEGREE;
use crate::error::Result;
use crate::series::MetricSeries;

pub use config::{DetectionConfig, ThresholdPolicy, TriggerRule};
pub use polyfit::PolynomialFit;
pub use threshold::{analyzed_series, compute_threshold};

/// Outcome of analyzing one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    /// First frame of the chunk.
    pub start: usize,
    /// One past the last frame of the chunk.
    pub end: usize,
    /// Sustained windows found on the fitted curve.
    pub detections: usize,
    /// Highest fitted value in the chunk, `None` if nothing could be fitted.
    pub peak_fit: Option<f64>,
    pub triggered: bool,
}

impl DetectionResult {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn start_time(&self, fps: f64) -> f64 {
        self.start as f64 / fps
    }

    pub fn end_time(&self, fps: f64) -> f64 {
        self.end as f64 / fps
    }
}

/// Detections for every chunk of `series`, in chunk order.
pub fn analyze(series: &MetricSeries, config: &DetectionConfig) -> Result<Vec<DetectionResult>> {
    config.validate()?;

    let analyzed = analyzed_series(series, &config.policy)?;
    let alpha = config.resolved_sensitivity();
    let threshold = compute_threshold(&analyzed, alpha)?;
    info!(
        frames = series.len(),
        policy = %config.policy,
        alpha,
        threshold,
        "Analyzing metric series"
    );

    let starts: Vec<usize> = (0..analyzed.len()).step_by(config.chunk_size).collect();
    let results: Vec<DetectionResult> = starts
        .into_par_iter()
        .map(|start| {
            let end = (start + config.chunk_size).min(analyzed.len());
            analyze_chunk(analyzed.slice(start..end), start, threshold, config)
        })
        .collect();

    let triggered = results.iter().filter(|r| r.triggered).count();
    info!(chunks = results.len(), triggered, "Analysis complete");
    Ok(results)
}

/// Analyze one chunk whose first sample is frame `start`.
pub fn analyze_chunk(
    values: &[Option<f64>],
    start: usize,
    threshold: f64,
    config: &DetectionConfig,
) -> DetectionResult {
    let end = start + values.len();
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(pos, v)| v.map(|v| (pos as f64, v)))
        .collect();

    let Some(fit) = PolynomialFit::fit(&points, POLYNOMIAL_DEGREE) else {
        debug!(start, end, "Chunk has no defined metrics");
        return DetectionResult {
            start,
            end,
            detections: 0,
            peak_fit: None,
            triggered: false,
        };
    };

    let fitted: Vec<f64> = (0..values.len()).map(|x| fit.evaluate(x as f64)).collect();
    let detections = count_sustained(&fitted, threshold, config.window);
    let peak_fit = fitted.iter().copied().reduce(f64::max);

    let triggered = match config.trigger {
        TriggerRule::Sustained => detections as f64 >= config.fps,
        TriggerRule::Peak => points.iter().any(|&(_, v)| v >= threshold),
    };

    debug!(start, end, detections, triggered, "Chunk analyzed");
    DetectionResult {
        start,
        end,
        detections,
        peak_fit,
        triggered,
    }
}

/// Count non-overlapping runs of `window` consecutive samples at or above
/// `threshold`. After a hit the scan jumps past the run; otherwise it moves
/// by one sample.
pub fn count_sustained(fitted: &[f64], threshold: f64, window: usize) -> usize {
    if window == 0 {
        return 0;
    }
    let mut detections = 0;
    let mut x = 0;
    while x + window <= fitted.len() {
        if fitted[x..x + window].iter().all(|&v| v >= threshold) {
            detections += 1;
            x += window;
        } else {
            x += 1;
        }
    }
    detections
}
