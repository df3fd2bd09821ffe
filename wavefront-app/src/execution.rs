//! Handles the core execution logic for standard mode.

use crate::config::{Backend, GeneratorKind, Settings, VisualizationMode};
use crate::error::AppError;
use crate::output;
use crate::progress::{LogProgressReporter, ProgressReporter};
use crate::visualization::{TerminalVisualizer, Visualizer};
use log::{info, warn};
use wfp_core::{
    CpuWavefrontDispatch, DisplayMirror, MazeSource, RunController, RunSummary, WavefrontDispatch,
};
use wfp_gpu::{GpuContext, GpuWavefrontDispatch};
use wfp_maze::{BitmapSource, BuiltinGenerator, ExternalGenerator};

/// The maze source the settings ask for. A bitmap file wins over any generator.
pub fn build_source(settings: &Settings) -> Box<dyn MazeSource> {
    if let Some(path) = &settings.maze_file {
        info!("Reading maze from {:?}", path);
        return Box::new(BitmapSource::new(path.clone()));
    }
    match settings.generator {
        GeneratorKind::Builtin => Box::new(
            settings
                .seed
                .map_or_else(BuiltinGenerator::new, BuiltinGenerator::with_seed),
        ),
        GeneratorKind::External => {
            let command = settings.external_command();
            info!(
                "Using external generator: {} {:?}",
                command.program, command.args
            );
            Box::new(ExternalGenerator::new(command))
        }
    }
}

pub fn cpu_dispatch(settings: &Settings) -> CpuWavefrontDispatch {
    CpuWavefrontDispatch::with_parallel_threshold(settings.run_config().parallel_threshold)
}

/// The dispatch backend for a run; a GPU request falls back to the CPU when no
/// device can be acquired.
pub async fn build_dispatch(settings: &Settings) -> Box<dyn WavefrontDispatch> {
    match settings.backend {
        Backend::Cpu => Box::new(cpu_dispatch(settings)),
        Backend::Gpu => match GpuContext::new().await {
            Ok(context) => {
                info!("Initializing GPU dispatch...");
                Box::new(GpuWavefrontDispatch::new(context))
            }
            Err(e) => {
                warn!(
                    "Failed to initialize GPU dispatch: {}. Falling back to CPU.",
                    e
                );
                Box::new(cpu_dispatch(settings))
            }
        },
    }
}

/// Ticks one run until it stops, then reports and saves its summary.
///
/// The loop ends on a terminal phase, on the tick limit, or on Ctrl-C while pausing
/// between ticks. A backtracking stall ends the run with its state kept; other
/// errors are returned.
pub async fn run_standard_mode(settings: &Settings) -> Result<RunSummary, AppError> {
    let dispatch = build_dispatch(settings).await;
    let mut run = RunController::new(settings.run_config(), build_source(settings), dispatch)?;

    let mut reporter = LogProgressReporter::new(
        settings.progress_log_level.into(),
        settings.report_progress_interval()?,
    );
    let mut visualizer = (settings.visualization_mode == VisualizationMode::Terminal)
        .then(TerminalVisualizer::stdout);
    let mut mirror = DisplayMirror::new();
    let interval = settings.tick_interval()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks = 0u64;
    while !run.phase().is_terminal() {
        if settings.max_ticks.is_some_and(|max| ticks >= max) {
            info!("Tick limit of {} reached in phase '{}'", ticks, run.phase());
            break;
        }
        ticks += 1;
        match run.tick_default() {
            Ok(outcome) => reporter.report(ticks, &outcome, &run),
            Err(e) => {
                reporter.fail(&e);
                if e.is_fatal() {
                    return Err(e.into());
                }
                break;
            }
        }

        if let Some(visualizer) = visualizer.as_mut() {
            if ticks % settings.render_every == 0 || run.phase().is_terminal() {
                run.publish(&mut mirror);
                visualizer.display_state(&mirror)?;
            }
        }

        if let Some(interval) = interval {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = &mut ctrl_c => {
                    warn!("Interrupted after {} ticks", ticks);
                    break;
                }
            }
        }
    }

    let summary = run.summary();
    reporter.finish(&summary);
    output::print_summary(&summary);
    if let Some(path) = &settings.output_path {
        output::save_summary_to_file(&summary, path)?;
    }
    Ok(summary)
}
