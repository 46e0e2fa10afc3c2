use std::sync::Arc;

use tracing::{info, warn};

use crate::aggregate::{Aggregator, FrameFailure, ScanOutput};
use crate::detect::{analyze, DetectionResult};
use crate::error::{MetricFault, Result};
use crate::extract::{trimmer_for, ClipExtractor, ExtractionReport};
use crate::io::metric_table::{read_metric_table, write_metric_table};
use crate::io::source::{frames, open_source};
use crate::series::MetricSeries;

use super::config::MeteorConfig;
use super::types::{NoOpReporter, PipelineStage, ProgressReporter, RunReport};

/// First pass: compute the metric of every frame of `config.input` and
/// persist the series to `config.metric_table`.
pub fn scan_video(
    config: &MeteorConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<ScanOutput> {
    config.validate()?;

    let mut source = open_source(&config.input)?;
    let info = source.info().clone();
    info!(
        input = %info.filename.display(),
        shape = %info.shape,
        frames = ?info.total_frames,
        "Opened recording"
    );
    if let Some(fps) = info.fps {
        if (fps - config.detection.fps).abs() > 0.01 {
            warn!(
                declared = fps,
                configured = config.detection.fps,
                "Recording frame rate differs from the configured fps"
            );
        }
    }

    let output = Aggregator::new(config.scan.clone())
        .with_reporter(reporter.clone())
        .expected_frames(info.total_frames)
        .run(frames(source.as_mut()));
    source.close()?;
    let output = output?;

    reporter.begin_stage(PipelineStage::Persisting, None);
    write_metric_table(&config.metric_table, &output.series)?;
    reporter.finish_stage();

    Ok(output)
}

/// Second pass: analyze `series` and, unless `extract` is false, cut clips
/// and composites for every triggered chunk.
pub fn detect_and_extract(
    config: &MeteorConfig,
    series: &MetricSeries,
    extract: bool,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<(Vec<DetectionResult>, ExtractionReport)> {
    reporter.begin_stage(PipelineStage::Analyzing, None);
    let detections = analyze(series, &config.detection)?;
    reporter.finish_stage();

    if !extract || !detections.iter().any(|d| d.triggered) {
        return Ok((detections, ExtractionReport::default()));
    }

    let trimmer = trimmer_for(&config.input, &config.extraction)?;
    let report = ClipExtractor::new(config.extraction.clone(), trimmer)
        .with_reporter(reporter)
        .extract(
            &detections,
            &config.input,
            &config.output_dir,
            config.detection.fps,
        )?;
    Ok((detections, report))
}

/// Detection pass from a previously written metric table.
///
/// Empty table slots come back as [`MetricFault::Unrecorded`] frame failures;
/// the table keeps which frames failed, not why.
pub fn run_detection_reported(
    config: &MeteorConfig,
    extract: bool,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunReport> {
    config.validate()?;
    let series = read_metric_table(&config.metric_table)?;
    let frame_failures: Vec<FrameFailure> = series
        .undefined_indices()
        .map(|index| FrameFailure {
            index,
            fault: MetricFault::Unrecorded,
        })
        .collect();
    if !frame_failures.is_empty() {
        warn!(
            undefined = frame_failures.len(),
            frames = series.len(),
            "Metric table has frames without a metric"
        );
    }
    let (detections, extraction) = detect_and_extract(config, &series, extract, reporter)?;
    Ok(RunReport {
        frames: series.len(),
        frame_failures,
        detections,
        extraction,
    })
}

/// Both passes back to back. The series is persisted between them exactly
/// as in a split run.
pub fn run_pipeline_reported(
    config: &MeteorConfig,
    extract: bool,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunReport> {
    let scan = scan_video(config, reporter.clone())?;
    let (detections, extraction) = detect_and_extract(config, &scan.series, extract, reporter)?;
    Ok(RunReport {
        frames: scan.frames(),
        frame_failures: scan.failures,
        detections,
        extraction,
    })
}

/// Run both passes without progress reporting.
pub fn run_pipeline(config: &MeteorConfig) -> Result<RunReport> {
    run_pipeline_reported(config, true, Arc::new(NoOpReporter))
}
