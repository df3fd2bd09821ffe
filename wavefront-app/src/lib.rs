//! Wavefront application library.
//!
//! Configuration, logging, the tick loop, terminal rendering, result output and
//! backend benchmarks for the `wavefront` binary.

pub mod benchmark;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod progress;
pub mod visualization;

pub use config::{AppConfig, Settings};
pub use error::AppError;

use anyhow::{Context, Result};
use clap::Parser;

/// Parses the command line and runs the selected mode to completion.
pub fn run() -> Result<()> {
    let cli = AppConfig::parse();
    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(run_with(cli))
}

/// Runs with an already-parsed command line.
pub async fn run_with(cli: AppConfig) -> Result<()> {
    let settings = Settings::load(&cli)?;
    logging::init_logger(&settings);

    log::info!("Wavefront starting");
    log::debug!("Loaded settings: {:?}", settings);

    if settings.benchmark_mode {
        log::info!("Benchmark mode enabled.");
        let results = benchmark::run_benchmarks(&settings)?;
        benchmark::report_comparison(&results);
        if let Some(path) = &settings.benchmark_csv_output {
            benchmark::write_results_to_csv(&results, path)?;
        }
    } else {
        let summary = execution::run_standard_mode(&settings).await?;
        log::info!("Run ended in phase '{}'", summary.phase);
    }

    log::info!("Wavefront finished.");
    Ok(())
}
