use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use meteor_core::pipeline::run_pipeline_reported;

use super::options::{base_config, DetectionOptions, ExtractionOptions, ScanOptions};
use crate::progress::BarReporter;
use crate::summary::{print_detection_header, print_run_report, print_scan_header};

#[derive(Args)]
pub struct RunArgs {
    /// Input video or SER file
    pub file: PathBuf,

    /// Config file (TOML); processing options on the command line are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Metric table written between the two passes
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    #[command(flatten)]
    pub scan: ScanOptions,

    #[command(flatten)]
    pub detection: DetectionOptions,

    #[command(flatten)]
    pub extraction: ExtractionOptions,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let (mut config, from_file) = base_config(
        args.config.as_deref(),
        &args.file,
        args.table.as_deref(),
        args.extraction.output_dir.as_deref(),
    )?;
    if !from_file {
        config.scan = args.scan.to_config();
        config.detection = args.detection.to_config();
        config.extraction = args.extraction.to_config();
    }
    config.validate().context("Invalid configuration")?;

    print_scan_header(&config);
    print_detection_header(&config);

    let reporter = Arc::new(BarReporter::new());
    let report = run_pipeline_reported(&config, !args.extraction.dry_run, reporter)?;
    print_run_report(&config, &report);

    Ok(())
}
