use thiserror::Error;
use wfp_core::{GenerationError, RunError};
use wfp_gpu::GpuError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Settings Error: {0}")]
    Settings(#[from] figment::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Maze Generation Error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Run Error: {0}")]
    Run(#[from] RunError),

    #[error("GPU Error: {0}")]
    Gpu(#[from] GpuError),

    #[error("Output Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Visualization Error: {0}")]
    Visualization(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
