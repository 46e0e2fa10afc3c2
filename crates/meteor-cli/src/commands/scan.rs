use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use meteor_core::pipeline::scan_video;

use super::options::{base_config, ScanOptions};
use crate::progress::BarReporter;
use crate::summary::{print_frame_failures, print_scan_header};

#[derive(Args)]
pub struct ScanArgs {
    /// Input video or SER file
    pub file: PathBuf,

    /// Config file (TOML); scan options on the command line are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Metric table to write (gzip CSV)
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    #[command(flatten)]
    pub scan: ScanOptions,
}

pub fn run(args: &ScanArgs) -> Result<()> {
    let (mut config, from_file) = base_config(
        args.config.as_deref(),
        &args.file,
        args.table.as_deref(),
        None,
    )?;
    if !from_file {
        config.scan = args.scan.to_config();
    }
    config.validate().context("Invalid configuration")?;

    print_scan_header(&config);

    let reporter = Arc::new(BarReporter::new());
    let output = scan_video(&config, reporter)?;

    println!(
        "\nScanned {} frames, metric table saved to {}",
        output.frames(),
        config.metric_table.display()
    );
    print_frame_failures(&output.failures);

    Ok(())
}
