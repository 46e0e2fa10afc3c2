use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use meteor_core::pipeline::run_detection_reported;

use super::options::{base_config, DetectionOptions, ExtractionOptions};
use crate::progress::BarReporter;
use crate::summary::{print_detection_header, print_run_report};

#[derive(Args)]
pub struct DetectArgs {
    /// Metric table written by `meteor scan`
    #[arg(short, long)]
    pub table: PathBuf,

    /// Recording the table was computed from
    #[arg(long)]
    pub video: PathBuf,

    /// Config file (TOML); detection options on the command line are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub detection: DetectionOptions,

    #[command(flatten)]
    pub extraction: ExtractionOptions,
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let (mut config, from_file) = base_config(
        args.config.as_deref(),
        &args.video,
        Some(&args.table),
        args.extraction.output_dir.as_deref(),
    )?;
    if !from_file {
        config.detection = args.detection.to_config();
        config.extraction = args.extraction.to_config();
    }
    config.validate().context("Invalid configuration")?;

    print_detection_header(&config);

    let reporter = Arc::new(BarReporter::new());
    let report = run_detection_reported(&config, !args.extraction.dry_run, reporter)?;
    print_run_report(&config, &report);

    Ok(())
}
