use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wfp_core::runner::DEFAULT_MAZE_SIZE;
use wfp_core::{CostMode, MazeAlgorithm, RunConfig};
use wfp_maze::{ExternalCommand, DEFAULT_ARTIFACT};

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "WAVEFRONT_";

/// Which dispatch implementation runs the expansion steps.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Cpu,
    /// Falls back to the CPU when no adapter is available.
    Gpu,
}

/// Where mazes come from.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Builtin,
    External,
}

/// Represents the different visualization modes available.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    None,
    Terminal,
}

/// Log level for progress reports.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Log level for everything that is not a progress report.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Command-line flags.
///
/// Every flag is optional so that only the flags actually given override the
/// configuration file and the environment.
#[derive(Parser, Serialize, Debug, Default)]
#[command(author, version, about = "Wavefront shortest-path search on generated mazes", long_about = None)]
pub struct AppConfig {
    /// TOML file with settings; flags and WAVEFRONT_* variables take precedence.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Side length of generated mazes.
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,

    /// Maze layout algorithm.
    #[arg(short, long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<MazeAlgorithm>,

    /// How traversal costs are assigned to open cells.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_mode: Option<CostMode>,

    /// Seed for maze generation and weighted costs.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Start cell as X,Y. Defaults to 1,1.
    #[arg(long, value_name = "X,Y", value_parser = parse_coords)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<[usize; 2]>,

    /// Target cell as X,Y. Defaults to the cell inside the far corner.
    #[arg(long, value_name = "X,Y", value_parser = parse_coords)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<[usize; 2]>,

    /// Dispatch backend.
    #[arg(short, long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,

    /// Maze generator.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorKind>,

    /// Program run by the external generator.
    #[arg(long, value_name = "PROGRAM")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_program: Option<String>,

    /// Arguments for the external generator; `{size}` and `{algorithm}` are substituted.
    #[arg(long, value_name = "ARG", num_args = 1.., allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_args: Option<Vec<String>>,

    /// Bitmap the external generator writes.
    #[arg(long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    /// Read the maze from a flat bitmap file instead of generating it.
    #[arg(long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maze_file: Option<PathBuf>,

    /// Stop after this many ticks even if the run has not finished.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,

    /// Pause between ticks (e.g., "10ms").
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_interval: Option<String>,

    /// Choose the visualization mode.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_mode: Option<VisualizationMode>,

    /// Render every N ticks when visualizing.
    #[arg(long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_every: Option<u64>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_progress_interval: Option<String>,

    /// Write the run summary as JSON.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_log_level: Option<GlobalLogLevel>,

    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_log_level: Option<ProgressLogLevel>,

    /// Run the same maze on every available backend and compare.
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub benchmark_mode: bool,

    /// Runs per backend in benchmark mode.
    #[arg(long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_runs: Option<usize>,

    /// Optional: Path to save benchmark results as a CSV file.
    /// Only used if benchmark_mode is also enabled.
    #[arg(long, value_name = "CSV_FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_csv_output: Option<PathBuf>,
}

fn parse_coords(value: &str) -> Result<[usize; 2], String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid coordinate '{part}': {e}"))
    };
    Ok([parse(x)?, parse(y)?])
}

fn parse_interval(value: &str) -> Result<String, humantime::DurationError> {
    humantime::parse_duration(value)?;
    Ok(value.to_string())
}

/// Fully resolved settings after layering defaults, file, environment and flags.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub size: usize,
    pub algorithm: MazeAlgorithm,
    pub cost_mode: CostMode,
    pub seed: Option<u64>,
    pub start: Option<[usize; 2]>,
    pub target: Option<[usize; 2]>,
    pub backend: Backend,
    pub generator: GeneratorKind,
    pub generator_program: String,
    pub generator_args: Vec<String>,
    pub artifact: PathBuf,
    pub maze_file: Option<PathBuf>,
    pub max_ticks: Option<u64>,
    pub tick_interval: Option<String>,
    pub visualization_mode: VisualizationMode,
    pub render_every: u64,
    pub report_progress_interval: Option<String>,
    pub output_path: Option<PathBuf>,
    pub global_log_level: GlobalLogLevel,
    pub progress_log_level: ProgressLogLevel,
    pub benchmark_mode: bool,
    pub benchmark_runs: usize,
    pub benchmark_csv_output: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let external = ExternalCommand::default();
        Self {
            size: DEFAULT_MAZE_SIZE,
            algorithm: MazeAlgorithm::default(),
            cost_mode: CostMode::default(),
            seed: None,
            start: None,
            target: None,
            backend: Backend::default(),
            generator: GeneratorKind::default(),
            generator_program: external.program,
            generator_args: external.args,
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            maze_file: None,
            max_ticks: None,
            tick_interval: None,
            visualization_mode: VisualizationMode::default(),
            render_every: 1,
            report_progress_interval: None,
            output_path: None,
            global_log_level: GlobalLogLevel::default(),
            progress_log_level: ProgressLogLevel::default(),
            benchmark_mode: false,
            benchmark_runs: 1,
            benchmark_csv_output: None,
        }
    }
}

impl Settings {
    /// Layers defaults, the optional TOML file, `WAVEFRONT_*` variables and the
    /// flags that were given, in increasing precedence.
    pub fn load(cli: &AppConfig) -> Result<Self, AppError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = &cli.config {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "Configuration file {path:?} does not exist"
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        let settings: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(cli))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.render_every == 0 {
            return Err(AppError::Config("render_every must be at least 1".into()));
        }
        if self.benchmark_runs == 0 {
            log::warn!("benchmark_runs is 0, benchmark mode will not run anything");
        }
        self.tick_interval()?;
        self.report_progress_interval()?;
        Ok(())
    }

    fn duration(name: &str, value: Option<&String>) -> Result<Option<Duration>, AppError> {
        value
            .map(|v| {
                humantime::parse_duration(v)
                    .map_err(|e| AppError::Config(format!("Invalid {name} '{v}': {e}")))
            })
            .transpose()
    }

    pub fn tick_interval(&self) -> Result<Option<Duration>, AppError> {
        Self::duration("tick_interval", self.tick_interval.as_ref())
    }

    pub fn report_progress_interval(&self) -> Result<Option<Duration>, AppError> {
        Self::duration(
            "report_progress_interval",
            self.report_progress_interval.as_ref(),
        )
    }

    /// The core run configuration these settings describe.
    pub fn run_config(&self) -> RunConfig {
        let mut builder = RunConfig::builder()
            .size(self.size)
            .algorithm(self.algorithm)
            .cost_mode(self.cost_mode);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if let Some([x, y]) = self.start {
            builder = builder.start(x, y);
        }
        if let Some([x, y]) = self.target {
            builder = builder.target(x, y);
        }
        builder.build()
    }

    pub fn external_command(&self) -> ExternalCommand {
        ExternalCommand {
            program: self.generator_program.clone(),
            args: self.generator_args.clone(),
            artifact: self.artifact.clone(),
            working_dir: None,
        }
    }
}
