mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meteor", about = "Meteor and transient detector for video recordings")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recording metadata
    Info(commands::info::InfoArgs),
    /// Compute the per-frame metric and write the metric table
    Scan(commands::scan::ScanArgs),
    /// Analyze a metric table and extract clips of triggered chunks
    Detect(commands::detect::DetectArgs),
    /// Scan and detect in one go
    Run(commands::run::RunArgs),
    /// Print or save a default config file
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Scan(args) => commands::scan::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
