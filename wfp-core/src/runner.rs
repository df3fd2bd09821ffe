use crate::backtrack::{BacktrackStep, BacktrackStuck, Backtracker};
use crate::cost::{CostMode, CostModel, GenerationError};
use crate::dispatch::cpu::DEFAULT_PARALLEL_THRESHOLD;
use crate::dispatch::WavefrontDispatch;
use crate::frontier::{EngineError, EngineState, FrontierEngine, StepOutcome};
use crate::grid::MazeGrid;
use crate::mirror::DisplayMirror;
use crate::source::MazeSource;
use crate::MazeAlgorithm;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default side length of generated mazes.
pub const DEFAULT_MAZE_SIZE: usize = 255;

/// Configuration options for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub size: usize,
    pub algorithm: MazeAlgorithm,
    pub cost_mode: CostMode,
    /// Seed for weighted cost draws. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Start cell as `(x, y)`. Defaults to `(1, 1)`.
    pub start: Option<(usize, usize)>,
    /// Target cell as `(x, y)`. Defaults to `(width - 2, height - 2)`.
    pub target: Option<(usize, usize)>,
    pub parallel_threshold: usize,
}

impl RunConfig {
    /// Creates a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Start coordinates for a `width` x `height` grid.
    pub fn start_coords(&self) -> (usize, usize) {
        self.start.unwrap_or((1, 1))
    }

    /// Target coordinates for a `width` x `height` grid.
    pub fn target_coords(&self, width: usize, height: usize) -> (usize, usize) {
        self.target
            .unwrap_or((width.saturating_sub(2), height.saturating_sub(2)))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_MAZE_SIZE,
            algorithm: MazeAlgorithm::default(),
            cost_mode: CostMode::default(),
            seed: None,
            start: None,
            target: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Builder for `RunConfig`.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Sets the side length of generated mazes.
    pub fn size(mut self, size: usize) -> Self {
        self.config.size = size;
        self
    }

    /// Sets the maze layout algorithm.
    pub fn algorithm(mut self, algorithm: MazeAlgorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn cost_mode(mut self, mode: CostMode) -> Self {
        self.config.cost_mode = mode;
        self
    }

    /// Sets the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn start(mut self, x: usize, y: usize) -> Self {
        self.config.start = Some((x, y));
        self
    }

    pub fn target(mut self, x: usize, y: usize) -> Self {
        self.config.target = Some((x, y));
        self
    }

    /// Frontier size from which the CPU dispatch fans out on the rayon pool.
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// Builds the `RunConfig` instance.
    pub fn build(self) -> RunConfig {
        self.config
    }
}

/// Errors surfaced by [`RunController`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The generator failed or produced an unusable bitmap.
    #[error("Maze generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// The frontier engine rejected an operation or detected a contract violation.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Path reconstruction stalled. The maze and distances are left intact.
    #[error(transparent)]
    BacktrackStuck(#[from] BacktrackStuck),
    /// Configured coordinates fall outside the grid.
    #[error("Cell ({x}, {y}) is outside the {width}x{height} grid")]
    InvalidCoordinates {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

impl RunError {
    /// Everything except a backtracking stall ends the run.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::BacktrackStuck(_))
    }
}

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunPhase {
    /// Expanding the wavefront.
    Searching,
    /// Target found; revealing the path one hop per tick.
    Backtracking,
    PathComplete,
    /// The frontier emptied before the target was reached.
    NoPath,
    /// Backtracking stalled; state is kept for inspection.
    Halted,
    /// A fatal engine error ended the run.
    Failed,
}

impl RunPhase {
    /// No further tick changes anything.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Searching | Self::Backtracking)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Searching => "searching",
            Self::Backtracking => "backtracking",
            Self::PathComplete => "path complete",
            Self::NoPath => "no path",
            Self::Halted => "halted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a single [`RunController::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One engine step ran and the search continues.
    Searching { step: u64, frontier_size: usize },
    /// The engine reached the target and backtracking has started.
    TargetFound { step: u64, distance: i32 },
    /// One backtrack hop.
    PathAdvanced { index: usize, distance: i32 },
    /// The path reached the start cell.
    PathComplete { length: usize },
    /// The frontier emptied; a normal terminal outcome.
    NoPathFound { steps: u64 },
    /// The run is already terminal.
    Idle,
}

/// Condensed view of a run for reports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub phase: RunPhase,
    pub backend: String,
    pub width: usize,
    pub height: usize,
    pub start_index: usize,
    pub target_index: usize,
    pub steps: u64,
    pub found_at_step: Option<u64>,
    pub target_distance: Option<i32>,
    pub path_length: Option<usize>,
    pub peak_frontier_size: usize,
    pub discovered_cells: usize,
}

/// Sequences one engine step or one backtrack hop per tick, and owns the
/// restart and regenerate lifecycle.
#[derive(Debug)]
pub struct RunController {
    config: RunConfig,
    source: Box<dyn MazeSource>,
    rng: StdRng,
    cost_model: CostModel,
    engine: FrontierEngine,
    backtracker: Backtracker,
    start_index: usize,
    target_index: usize,
    phase: RunPhase,
}

impl RunController {
    /// Generates the first maze from `source` and initializes a run on it.
    ///
    /// # Errors
    ///
    /// * [`RunError::Generation`] when the generator fails; no run is started.
    /// * [`RunError::InvalidCoordinates`] or [`RunError::Engine`] when the start cell
    ///   is unusable on the generated grid.
    pub fn new(
        config: RunConfig,
        mut source: Box<dyn MazeSource>,
        dispatch: Box<dyn WavefrontDispatch>,
    ) -> Result<Self, RunError> {
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let raw = source.generate(config.size, config.algorithm)?;
        let cost_model = CostModel::build(&raw, config.cost_mode, &mut rng)?;
        let (start_index, target_index) = resolve_cells(&config, cost_model.as_grid())?;

        let mut engine = FrontierEngine::new(dispatch);
        engine.init(cost_model.grid(), start_index)?;
        info!(
            "Run started: {}x{} {} maze, start {}, target {}",
            cost_model.as_grid().width(),
            cost_model.as_grid().height(),
            config.algorithm,
            start_index,
            target_index
        );
        Ok(Self {
            config,
            source,
            rng,
            cost_model,
            engine,
            backtracker: Backtracker::new(),
            start_index,
            target_index,
            phase: RunPhase::Searching,
        })
    }

    /// Advances the run by exactly one engine step or one backtrack hop.
    ///
    /// `target_index` is read while searching; once found, backtracking follows the
    /// target that was reached.
    ///
    /// # Errors
    ///
    /// Engine errors are returned as-is; consistency violations and dispatch failures
    /// also move the run to [`RunPhase::Failed`]. A backtracking stall returns
    /// [`RunError::BacktrackStuck`] and halts the run without clearing any state.
    pub fn tick(&mut self, target_index: usize) -> Result<TickOutcome, RunError> {
        match self.phase {
            RunPhase::Searching => self.tick_search(target_index),
            RunPhase::Backtracking => self.tick_backtrack(),
            _ => Ok(TickOutcome::Idle),
        }
    }

    /// [`RunController::tick`] against the configured target.
    pub fn tick_default(&mut self) -> Result<TickOutcome, RunError> {
        self.tick(self.target_index)
    }

    fn tick_search(&mut self, target_index: usize) -> Result<TickOutcome, RunError> {
        let outcome = match self.engine.step(target_index) {
            Ok(outcome) => outcome,
            Err(err) => {
                if matches!(err, EngineError::Consistency(_) | EngineError::Dispatch(_)) {
                    error!("Run failed: {}", err);
                    self.phase = RunPhase::Failed;
                }
                return Err(err.into());
            }
        };
        let step = self.engine.step_count();
        match outcome {
            StepOutcome::Continue => Ok(TickOutcome::Searching {
                step,
                frontier_size: self.engine.frontier().current_frontier_size(),
            }),
            StepOutcome::NoPath => {
                self.phase = RunPhase::NoPath;
                Ok(TickOutcome::NoPathFound { steps: step })
            }
            StepOutcome::Found => {
                let distance = self.engine.distances()[target_index];
                self.target_index = target_index;
                if let Err(stuck) = self.backtracker.start(
                    self.cost_model.grid(),
                    self.engine.distances(),
                    self.start_index,
                    target_index,
                ) {
                    self.phase = RunPhase::Halted;
                    return Err(stuck.into());
                }
                self.phase = if self.backtracker.is_complete() {
                    RunPhase::PathComplete
                } else {
                    RunPhase::Backtracking
                };
                Ok(TickOutcome::TargetFound { step, distance })
            }
        }
    }

    fn tick_backtrack(&mut self) -> Result<TickOutcome, RunError> {
        match self.backtracker.step(self.engine.distances()) {
            Ok(BacktrackStep::Advanced { index, distance }) => {
                Ok(TickOutcome::PathAdvanced { index, distance })
            }
            Ok(BacktrackStep::Complete { length }) => {
                self.phase = RunPhase::PathComplete;
                info!("Path complete: {} cells", length);
                Ok(TickOutcome::PathComplete { length })
            }
            Ok(BacktrackStep::Idle) => {
                self.phase = RunPhase::Halted;
                Ok(TickOutcome::Idle)
            }
            Err(stuck) => {
                warn!("Backtracking halted: {}", stuck);
                self.phase = RunPhase::Halted;
                Err(stuck.into())
            }
        }
    }

    /// Re-initializes the engine against the current cost model and clears the path.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Engine`] if the engine rejects the start cell or the
    /// backend fails to prepare.
    pub fn restart(&mut self) -> Result<(), RunError> {
        let (_, target_index) = resolve_cells(&self.config, self.cost_model.as_grid())?;
        self.engine.init(self.cost_model.grid(), self.start_index)?;
        self.backtracker.reset();
        self.target_index = target_index;
        self.phase = RunPhase::Searching;
        info!("Run restarted from cell {}", self.start_index);
        Ok(())
    }

    /// Requests a new bitmap from the generator, rebuilds the cost model and restarts.
    ///
    /// # Errors
    ///
    /// On any error the previous maze and run are kept untouched.
    pub fn regenerate(&mut self, size: usize, algorithm: MazeAlgorithm) -> Result<(), RunError> {
        let raw = self.source.generate(size, algorithm)?;
        let cost_model = CostModel::build(&raw, self.config.cost_mode, &mut self.rng)?;
        let (start_index, target_index) = resolve_cells(&self.config, cost_model.as_grid())?;
        self.engine.init(cost_model.grid(), start_index)?;

        self.cost_model = cost_model;
        self.config.size = size;
        self.config.algorithm = algorithm;
        self.start_index = start_index;
        self.target_index = target_index;
        self.backtracker.reset();
        self.phase = RunPhase::Searching;
        info!(
            "Regenerated {}x{} {} maze",
            self.cost_model.as_grid().width(),
            self.cost_model.as_grid().height(),
            algorithm
        );
        Ok(())
    }

    /// Pushes the current cost grid, distances and path marks into `mirror`.
    pub fn publish(&self, mirror: &mut DisplayMirror) {
        let marks = self.backtracker.state().map(|s| s.visited_for_path());
        mirror.publish(self.cost_model.as_grid(), self.engine.distances(), marks);
    }

    pub fn summary(&self) -> RunSummary {
        let grid = self.cost_model.as_grid();
        let frontier = self.engine.frontier();
        let target_distance = self
            .engine
            .distances()
            .get(self.target_index)
            .copied()
            .filter(|&d| d >= 0);
        let path_length = (self.phase == RunPhase::PathComplete).then(|| self.backtracker.path().len());
        RunSummary {
            phase: self.phase,
            backend: self.engine.backend_name().to_string(),
            width: grid.width(),
            height: grid.height(),
            start_index: self.start_index,
            target_index: self.target_index,
            steps: frontier.step_count(),
            found_at_step: self.engine.found_at_step(),
            target_distance,
            path_length,
            peak_frontier_size: frontier.peak_frontier_size(),
            discovered_cells: frontier.discovered(),
        }
    }

    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    pub const fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub const fn engine(&self) -> &FrontierEngine {
        &self.engine
    }

    pub const fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    pub const fn backtracker(&self) -> &Backtracker {
        &self.backtracker
    }

    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    pub const fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn distances(&self) -> &[i32] {
        self.engine.distances()
    }

    /// Reconstructed path so far, target first.
    pub fn path(&self) -> &[usize] {
        self.backtracker.path()
    }
}

fn resolve_cells(config: &RunConfig, grid: &MazeGrid) -> Result<(usize, usize), RunError> {
    let (width, height) = (grid.width(), grid.height());
    let to_index = |(x, y): (usize, usize)| {
        grid.index(x, y).ok_or(RunError::InvalidCoordinates {
            x,
            y,
            width,
            height,
        })
    };
    Ok((
        to_index(config.start_coords())?,
        to_index(config.target_coords(width, height))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::cpu::CpuWavefrontDispatch;
    use crate::source::{FixedMazeSource, RawMaze};

    const BORDERED_5X5: &str = "
        #####
        #...#
        #...#
        #...#
        #####
    ";

    fn controller(art: &str) -> RunController {
        let raw = RawMaze::from_ascii(art).unwrap();
        RunController::new(
            RunConfig::builder().size(raw.width).seed(1).build(),
            Box::new(FixedMazeSource::new(raw)),
            Box::new(CpuWavefrontDispatch::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_default_cells() {
        let run = controller(BORDERED_5X5);
        assert_eq!(run.start_index(), 6);
        assert_eq!(run.target_index(), 18);
        assert_eq!(run.phase(), RunPhase::Searching);
    }

    #[test]
    fn test_tick_sequence_on_bordered_grid() {
        let mut run = controller(BORDERED_5X5);
        for step in 1..=3 {
            assert!(matches!(
                run.tick_default().unwrap(),
                TickOutcome::Searching { step: s, .. } if s == step
            ));
        }
        assert_eq!(
            run.tick_default().unwrap(),
            TickOutcome::TargetFound { step: 4, distance: 4 }
        );
        assert_eq!(run.phase(), RunPhase::Backtracking);
        for _ in 0..3 {
            assert!(matches!(run.tick_default().unwrap(), TickOutcome::PathAdvanced { .. }));
        }
        assert_eq!(run.tick_default().unwrap(), TickOutcome::PathComplete { length: 5 });
        assert_eq!(run.tick_default().unwrap(), TickOutcome::Idle);

        let summary = run.summary();
        assert_eq!(summary.phase, RunPhase::PathComplete);
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.target_distance, Some(4));
        assert_eq!(summary.path_length, Some(5));
        assert_eq!(summary.backend, "cpu");
    }

    #[test]
    fn test_walled_target_reaches_no_path() {
        let mut run = controller(BORDERED_5X5);
        let wall = 0;
        let mut outcome = run.tick(wall).unwrap();
        while matches!(outcome, TickOutcome::Searching { .. }) {
            outcome = run.tick(wall).unwrap();
        }
        assert!(matches!(outcome, TickOutcome::NoPathFound { .. }));
        assert_eq!(run.phase(), RunPhase::NoPath);
        assert_eq!(run.distances()[wall], -1);
        assert!(!run.engine().frontier().found_flag());
    }

    #[test]
    fn test_publish_sends_path_marks() {
        let mut run = controller(BORDERED_5X5);
        while !run.phase().is_terminal() {
            run.tick_default().unwrap();
        }
        let mut mirror = DisplayMirror::new();
        run.publish(&mut mirror);
        assert_eq!(mirror.max_distance(), 4);
        assert_eq!(mirror.path_marks().iter().filter(|&&m| m == 2).count(), 5);
    }

    #[test]
    fn test_regenerate_failure_keeps_previous_run() {
        #[derive(Debug)]
        struct Failing;
        impl MazeSource for Failing {
            fn generate(
                &mut self,
                _size: usize,
                _algorithm: MazeAlgorithm,
            ) -> Result<RawMaze, GenerationError> {
                Err(GenerationError::ProcessFailed {
                    status: "exit status: 1".to_string(),
                })
            }
        }

        let raw = RawMaze::from_ascii(BORDERED_5X5).unwrap();
        let mut run = RunController::new(
            RunConfig::builder().size(5).build(),
            Box::new(FixedMazeSource::new(raw)),
            Box::new(CpuWavefrontDispatch::new()),
        )
        .unwrap();
        run.tick_default().unwrap();
        run.source = Box::new(Failing);
        let err = run.regenerate(9, MazeAlgorithm::Kruskal).unwrap_err();
        assert!(matches!(err, RunError::Generation(_)));
        assert!(err.is_fatal());
        assert_eq!(run.engine().step_count(), 1);
        assert_eq!(run.config().size, 5);
    }

    #[test]
    fn test_start_outside_grid_is_rejected() {
        let raw = RawMaze::from_ascii(BORDERED_5X5).unwrap();
        let err = RunController::new(
            RunConfig::builder().start(7, 1).build(),
            Box::new(FixedMazeSource::new(raw)),
            Box::new(CpuWavefrontDispatch::new()),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::InvalidCoordinates { x: 7, y: 1, .. }));
    }

    #[test]
    fn test_backtrack_stall_is_not_fatal() {
        let stuck = RunError::from(BacktrackStuck {
            index: 3,
            distance: 2,
        });
        assert!(!stuck.is_fatal());
    }
}
