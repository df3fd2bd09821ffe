//! Logging setup for the application.

use crate::config::{GlobalLogLevel, ProgressLogLevel, Settings};
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Module whose records follow `progress_log_level` instead of the global level.
pub const PROGRESS_MODULE: &str = "wavefront_app::progress";

impl From<ProgressLogLevel> for LevelFilter {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

impl From<GlobalLogLevel> for LevelFilter {
    fn from(level: GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

/// Initializes the logger from the application settings.
///
/// `RUST_LOG` is read first; the configured global level then applies to every
/// module except [`PROGRESS_MODULE`], which gets `progress_log_level`.
/// Calling this twice keeps the first logger.
pub fn init_logger(settings: &Settings) {
    let env = Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);
    builder.filter_level(settings.global_log_level.into());
    builder.filter_module(PROGRESS_MODULE, settings.progress_log_level.into());

    if builder.try_init().is_err() {
        return;
    }
    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        settings.global_log_level,
        settings.progress_log_level
    );
}
