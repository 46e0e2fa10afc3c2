pub mod config;
mod orchestrator;
mod types;

pub use config::MeteorConfig;
pub use orchestrator::{
    detect_and_extract, run_detection_reported, run_pipeline, run_pipeline_reported, scan_video,
};
pub use types::{NoOpReporter, PipelineStage, ProgressReporter, RunReport};
