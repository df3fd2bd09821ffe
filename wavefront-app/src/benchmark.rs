//! Benchmarking utilities comparing dispatch backends on one maze.

use crate::config::Settings;
use crate::error::AppError;
use crate::execution::{build_source, cpu_dispatch};
use colored::Colorize;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use wfp_core::{
    FixedMazeSource, RawMaze, RunController, RunPhase, TickOutcome, WavefrontDispatch,
};
use wfp_gpu::{GpuContext, GpuWavefrontDispatch};

/// Seed for weighted costs when none is configured, so every backend sees the same grid.
pub const DEFAULT_BENCHMARK_SEED: u64 = 0x5EED;

/// Represents the results of a single benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub backend: String,
    pub run: usize,
    pub width: usize,
    pub height: usize,
    pub phase: RunPhase,
    pub steps: u64,
    pub ticks: u64,
    pub target_distance: Option<i32>,
    pub path_length: Option<usize>,
    /// Wall-clock time until the target was found (or the search ended).
    pub search_time_ms: f64,
    /// Wall-clock time until the run reached a terminal phase.
    pub total_time_ms: f64,
}

/// Aggregated results for one backend over all runs.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkScenarioResult {
    pub backend: String,
    pub runs: usize,
    pub avg_total_time_ms: Option<f64>,
    pub median_total_time_ms: Option<f64>,
    pub stddev_total_time_ms: Option<f64>,
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

// --- Statistics Helper Functions ---
fn calculate_median(data: &mut [f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = data.len() / 2;
    if data.len() % 2 == 0 {
        Some((data[mid - 1] + data[mid]) / 2.0)
    } else {
        Some(data[mid])
    }
}

fn calculate_std_dev(data: &[f64], mean: f64) -> Option<f64> {
    let n = data.len();
    if n < 2 {
        return None;
    }
    let variance = data
        .iter()
        .map(|value| {
            let diff = mean - value;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64; // Use n-1 for sample standard deviation
    Some(variance.sqrt())
}
// --- End Statistics Helper Functions ---

/// Runs `maze` to completion on `dispatch` and times it.
pub fn run_single_benchmark(
    settings: &Settings,
    maze: &RawMaze,
    dispatch: Box<dyn WavefrontDispatch>,
    run_number: usize,
) -> Result<BenchmarkResult, AppError> {
    let mut config = settings.run_config();
    config.seed = Some(settings.seed.unwrap_or(DEFAULT_BENCHMARK_SEED));
    let mut run = RunController::new(config, Box::new(FixedMazeSource::new(maze.clone())), dispatch)?;
    let backend = run.engine().backend_name().to_string();

    let start_time = Instant::now();
    let mut search_time = None;
    let mut ticks = 0u64;
    while !run.phase().is_terminal() {
        ticks += 1;
        match run.tick_default()? {
            TickOutcome::TargetFound { .. } | TickOutcome::NoPathFound { .. } => {
                search_time = Some(start_time.elapsed());
            }
            _ => {}
        }
    }
    let total_time = start_time.elapsed();
    let summary = run.summary();

    Ok(BenchmarkResult {
        backend,
        run: run_number,
        width: summary.width,
        height: summary.height,
        phase: summary.phase,
        steps: summary.steps,
        ticks,
        target_distance: summary.target_distance,
        path_length: summary.path_length,
        search_time_ms: millis(search_time.unwrap_or(total_time)),
        total_time_ms: millis(total_time),
    })
}

/// Generates one maze and runs it `benchmark_runs` times on every backend that is
/// available. The GPU is skipped with a warning when no adapter is found.
pub fn run_benchmarks(settings: &Settings) -> Result<Vec<BenchmarkResult>, AppError> {
    if settings.benchmark_runs == 0 {
        warn!("Benchmark runs is 0, no benchmarks will be executed.");
        return Ok(Vec::new());
    }
    let maze = build_source(settings).generate(settings.size, settings.algorithm)?;
    info!(
        "Benchmarking {}x{} maze, {} runs per backend",
        maze.width, maze.height, settings.benchmark_runs
    );

    let mut results = Vec::new();
    for run in 1..=settings.benchmark_runs {
        results.push(run_single_benchmark(
            settings,
            &maze,
            Box::new(cpu_dispatch(settings)),
            run,
        )?);
    }

    match pollster::block_on(GpuContext::new()) {
        Ok(context) => {
            info!(
                "Using GPU: {} ({:?})",
                context.adapter_info.name, context.adapter_info.backend
            );
            for run in 1..=settings.benchmark_runs {
                let dispatch = Box::new(GpuWavefrontDispatch::new(context.clone()));
                results.push(run_single_benchmark(settings, &maze, dispatch, run)?);
            }
        }
        Err(e) => warn!("Skipping GPU benchmark: {}", e),
    }

    check_agreement(&results);
    Ok(results)
}

fn check_agreement(results: &[BenchmarkResult]) {
    let Some(first) = results.first() else {
        return;
    };
    for result in &results[1..] {
        if result.target_distance != first.target_distance {
            warn!(
                "Backend {} run {} reached distance {:?}, {} run {} reached {:?}",
                result.backend,
                result.run,
                result.target_distance,
                first.backend,
                first.run,
                first.target_distance
            );
        }
    }
}

/// Per-backend statistics, in the order the backends first appear.
pub fn summarize(results: &[BenchmarkResult]) -> Vec<BenchmarkScenarioResult> {
    let mut backends: Vec<&str> = Vec::new();
    for result in results {
        if !backends.contains(&result.backend.as_str()) {
            backends.push(&result.backend);
        }
    }
    backends
        .into_iter()
        .map(|backend| {
            let mut times: Vec<f64> = results
                .iter()
                .filter(|r| r.backend == backend)
                .map(|r| r.total_time_ms)
                .collect();
            let runs = times.len();
            let avg = (runs > 0).then(|| times.iter().sum::<f64>() / runs as f64);
            BenchmarkScenarioResult {
                backend: backend.to_string(),
                runs,
                avg_total_time_ms: avg,
                median_total_time_ms: calculate_median(&mut times),
                stddev_total_time_ms: avg.and_then(|mean| calculate_std_dev(&times, mean)),
            }
        })
        .collect()
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

/// Prints one table row per backend and the speedup of the fastest over the CPU.
pub fn report_comparison(results: &[BenchmarkResult]) {
    let scenarios = summarize(results);
    println!("{}", "--- Benchmark Results ---".bold());
    println!(
        "{:<8} {:>5} {:>12} {:>12} {:>12}",
        "backend", "runs", "avg ms", "median ms", "stddev ms"
    );
    for scenario in &scenarios {
        println!(
            "{:<8} {:>5} {:>12} {:>12} {:>12}",
            scenario.backend,
            scenario.runs,
            format_ms(scenario.avg_total_time_ms),
            format_ms(scenario.median_total_time_ms),
            format_ms(scenario.stddev_total_time_ms)
        );
    }
    let avg = |name: &str| {
        scenarios
            .iter()
            .find(|s| s.backend == name)
            .and_then(|s| s.avg_total_time_ms)
    };
    if let (Some(cpu), Some(gpu)) = (avg("cpu"), avg("gpu")) {
        if gpu > 0.0 {
            let speedup = cpu / gpu;
            let text = format!("GPU speedup over CPU: {speedup:.2}x");
            if speedup >= 1.0 {
                println!("{}", text.green());
            } else {
                println!("{}", text.yellow());
            }
        }
    }
}

/// Writes one row per run.
pub fn write_results_to_csv(results: &[BenchmarkResult], path: &Path) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    info!("Benchmark results written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(backend: &str, total_time_ms: f64) -> BenchmarkResult {
        BenchmarkResult {
            backend: backend.to_string(),
            run: 1,
            width: 5,
            height: 5,
            phase: RunPhase::PathComplete,
            steps: 4,
            ticks: 8,
            target_distance: Some(4),
            path_length: Some(5),
            search_time_ms: total_time_ms / 2.0,
            total_time_ms,
        }
    }

    #[test]
    fn test_median_and_std_dev() {
        assert_eq!(calculate_median(&mut []), None);
        assert_eq!(calculate_median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(calculate_median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(calculate_std_dev(&[1.0], 1.0), None);
        let sd = calculate_std_dev(&[2.0, 4.0], 3.0).unwrap();
        assert!((sd - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_groups_by_backend() {
        let results = [result("cpu", 2.0), result("gpu", 1.0), result("cpu", 4.0)];
        let scenarios = summarize(&results);
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].backend, "cpu");
        assert_eq!(scenarios[0].runs, 2);
        assert_eq!(scenarios[0].avg_total_time_ms, Some(3.0));
        assert_eq!(scenarios[1].median_total_time_ms, Some(1.0));
        assert_eq!(scenarios[1].stddev_total_time_ms, None);
    }

    #[test]
    fn test_single_benchmark_on_fixture() {
        let maze = RawMaze::from_ascii("#####\n#...#\n#...#\n#...#\n#####").unwrap();
        let settings = Settings {
            size: 5,
            ..Settings::default()
        };
        let result =
            run_single_benchmark(&settings, &maze, Box::new(cpu_dispatch(&settings)), 1).unwrap();
        assert_eq!(result.backend, "cpu");
        assert_eq!(result.phase, RunPhase::PathComplete);
        assert_eq!(result.steps, 4);
        assert_eq!(result.ticks, 8);
        assert_eq!(result.target_distance, Some(4));
        assert!(result.search_time_ms <= result.total_time_ms);
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.csv");
        write_results_to_csv(&[result("cpu", 2.0), result("gpu", 1.0)], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("backend,run,width,height,phase"));
        assert!(lines.next().unwrap().starts_with("cpu,1,5,5,path_complete,4,8,4,5"));
        assert_eq!(lines.count(), 1);
    }
}
