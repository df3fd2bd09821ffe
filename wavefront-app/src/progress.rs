use crate::config::ProgressLogLevel;
use log::Level;
use std::time::{Duration, Instant};
use wfp_core::{RunController, RunError, RunSummary, TickOutcome};

/// Trait for reporting the progress of a run.
///
/// Implementors of this trait can display progress information in various ways
/// (e.g., console output, log records).
pub trait ProgressReporter: Send {
    /// Called after every tick with the outcome and the controller it came from.
    fn report(&mut self, tick: u64, outcome: &TickOutcome, run: &RunController);

    /// Called once the run has stopped, whether or not it reached the target.
    fn finish(&mut self, summary: &RunSummary);

    /// Called when a tick returned an error.
    fn fail(&mut self, error: &RunError);
}

impl From<ProgressLogLevel> for Level {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

/// Writes progress through the `log` facade, at most once per `interval`.
///
/// Phase changes (target found, path complete, no path) are always reported.
#[derive(Debug)]
pub struct LogProgressReporter {
    level: Level,
    interval: Option<Duration>,
    last_report: Option<Instant>,
    reports: u64,
}

impl LogProgressReporter {
    /// With `interval = None` only phase changes are reported.
    pub const fn new(level: Level, interval: Option<Duration>) -> Self {
        Self {
            level,
            interval,
            last_report: None,
            reports: 0,
        }
    }

    /// Number of records written so far.
    pub const fn reports(&self) -> u64 {
        self.reports
    }

    fn due(&mut self) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let now = Instant::now();
        match self.last_report {
            Some(last) if now.duration_since(last) < interval => false,
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }

    fn emit(&mut self, message: &str) {
        self.reports += 1;
        log::log!(self.level, "{}", message);
    }
}

impl ProgressReporter for LogProgressReporter {
    fn report(&mut self, tick: u64, outcome: &TickOutcome, run: &RunController) {
        match *outcome {
            TickOutcome::TargetFound { step, distance } => {
                self.emit(&format!(
                    "Tick {tick}: target reached after {step} steps at distance {distance}"
                ));
            }
            TickOutcome::PathComplete { length } => {
                self.emit(&format!("Tick {tick}: path complete, {length} cells"));
            }
            TickOutcome::NoPathFound { steps } => {
                self.emit(&format!("Tick {tick}: no path after {steps} steps"));
            }
            TickOutcome::Searching {
                step,
                frontier_size,
            } => {
                if self.due() {
                    let discovered = run.engine().frontier().discovered();
                    let open = run.cost_model().as_grid().open_cells();
                    let percentage = if open > 0 {
                        (discovered as f64 / open as f64) * 100.0
                    } else {
                        100.0
                    };
                    self.emit(&format!(
                        "Progress: step {step}, frontier {frontier_size}, discovered {discovered}/{open} ({percentage:.1}%)"
                    ));
                }
            }
            TickOutcome::PathAdvanced { .. } => {
                if self.due() {
                    let revealed = run.backtracker().path().len();
                    self.emit(&format!("Progress: backtracking, {revealed} cells revealed"));
                }
            }
            TickOutcome::Idle => {}
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        self.emit(&format!(
            "Run finished ({}) after {} steps",
            summary.phase, summary.steps
        ));
    }

    fn fail(&mut self, error: &RunError) {
        self.reports += 1;
        if error.is_fatal() {
            log::error!("Run failed: {}", error);
        } else {
            log::warn!("Run halted: {}", error);
        }
    }
}
