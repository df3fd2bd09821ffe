//! Frontier buffers and the expansion state machine.
//!
//! `Idle -> Expanding -> {Found, Exhausted, Failed}`. [`FrontierEngine::init`] is the
//! only way back to `Expanding`; nothing is retained implicitly between runs.

use crate::dispatch::{DispatchArgs, DispatchError, WavefrontDispatch};
use crate::grid::{MazeGrid, SENTINEL};
use bitvec::prelude::*;
use log::{debug, error, info, trace};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Accelerator contract violations detected by the host.
///
/// These indicate a dispatch bug, never a transient condition, and are not retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineConsistencyError {
    /// The dispatch needed more frontier slots than the buffers hold.
    #[error("Next frontier overflow: {required} slots required, capacity {capacity}")]
    FrontierOverflow { required: usize, capacity: usize },
    /// The found flag was raised but the target has no distance.
    #[error("Found flag set but target {target} is undiscovered")]
    InconsistentFoundFlag { target: usize },
    /// A cell appeared twice in one next frontier.
    #[error("Cell {cell} appears more than once in the next frontier")]
    DuplicateFrontierEntry { cell: i32 },
    /// A next-frontier entry is out of bounds, a wall, or undiscovered.
    #[error("Invalid next-frontier entry {cell}: {reason}")]
    InvalidFrontierEntry { cell: i32, reason: &'static str },
}

/// Errors returned by [`FrontierEngine`] operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `init` was given a start cell that is out of bounds or a wall.
    #[error("Invalid start cell {index}: {reason}")]
    InvalidStart { index: usize, reason: &'static str },
    /// `step` was given a target outside the grid.
    #[error("Target cell {index} is outside the {cells}-cell grid")]
    InvalidTarget { index: usize, cells: usize },
    /// `step` was called outside the `Expanding` state.
    #[error("Step is only valid while expanding (engine is {0})")]
    NotExpanding(EngineState),
    /// Fatal contract violation by the accelerator.
    #[error("Engine consistency error: {0}")]
    Consistency(#[from] EngineConsistencyError),
    /// Any other dispatch failure.
    #[error("Dispatch error: {0}")]
    Dispatch(DispatchError),
}

impl From<DispatchError> for EngineError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::FrontierOverflow { required, capacity } => {
                Self::Consistency(EngineConsistencyError::FrontierOverflow { required, capacity })
            }
            other => Self::Dispatch(other),
        }
    }
}

/// Lifecycle states of the expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Idle,
    Expanding,
    Found,
    Exhausted,
    /// A dispatch error or contract violation ended the run.
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Expanding => "expanding",
            Self::Found => "found",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one [`FrontierEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The target was discovered during this step.
    Found,
    /// The frontier emptied before reaching the target.
    NoPath,
    /// More expansion is needed.
    Continue,
}

/// Ping-pong frontier buffers plus the distance field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierState {
    pub(crate) prev_frontier: Vec<i32>,
    pub(crate) next_frontier: Vec<i32>,
    pub(crate) distances: Vec<i32>,
    pub(crate) current_frontier_size: usize,
    pub(crate) found_flag: bool,
    pub(crate) step_count: u64,
    pub(crate) peak_frontier_size: usize,
}

impl FrontierState {
    fn empty() -> Self {
        Self {
            prev_frontier: Vec::new(),
            next_frontier: Vec::new(),
            distances: Vec::new(),
            current_frontier_size: 0,
            found_flag: false,
            step_count: 0,
            peak_frontier_size: 0,
        }
    }

    /// Fresh buffers for `grid` with `start` as the only frontier cell.
    fn seeded(grid: &MazeGrid, start: usize) -> Self {
        let capacity = grid.frontier_capacity();
        let mut prev_frontier = vec![SENTINEL; capacity];
        prev_frontier[0] = start as i32;
        let mut distances = vec![SENTINEL; grid.len()];
        distances[start] = 0;
        Self {
            prev_frontier,
            next_frontier: vec![SENTINEL; capacity],
            distances,
            current_frontier_size: 1,
            found_flag: false,
            step_count: 0,
            peak_frontier_size: 1,
        }
    }

    /// The valid prefix of the current frontier.
    pub fn frontier(&self) -> &[i32] {
        &self.prev_frontier[..self.current_frontier_size]
    }

    pub fn prev_frontier(&self) -> &[i32] {
        &self.prev_frontier
    }

    pub fn next_frontier(&self) -> &[i32] {
        &self.next_frontier
    }

    /// `-1` for undiscovered cells, otherwise the finalized distance from start.
    pub fn distances(&self) -> &[i32] {
        &self.distances
    }

    pub const fn current_frontier_size(&self) -> usize {
        self.current_frontier_size
    }

    pub const fn found_flag(&self) -> bool {
        self.found_flag
    }

    /// Number of completed dispatches in this run.
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Largest frontier seen in this run.
    pub const fn peak_frontier_size(&self) -> usize {
        self.peak_frontier_size
    }

    pub fn capacity(&self) -> usize {
        self.prev_frontier.len()
    }

    /// Number of discovered cells.
    pub fn discovered(&self) -> usize {
        self.distances.iter().filter(|&&d| d != SENTINEL).count()
    }
}

/// Owns the frontier buffers and drives the accelerator one step at a time.
#[derive(Debug)]
pub struct FrontierEngine {
    dispatch: Box<dyn WavefrontDispatch>,
    grid: Option<Arc<MazeGrid>>,
    state: EngineState,
    frontier: FrontierState,
    start_index: usize,
    found_at_step: Option<u64>,
    seen: BitVec,
}

impl FrontierEngine {
    /// Creates an idle engine that expands through `dispatch`.
    pub fn new(dispatch: Box<dyn WavefrontDispatch>) -> Self {
        Self {
            dispatch,
            grid: None,
            state: EngineState::Idle,
            frontier: FrontierState::empty(),
            start_index: 0,
            found_at_step: None,
            seen: BitVec::new(),
        }
    }

    /// Resets all buffers for a new run from `start_index` and enters `Expanding`.
    ///
    /// # Errors
    ///
    /// * [`EngineError::InvalidStart`] when the start is out of bounds or a wall.
    /// * [`EngineError::Dispatch`] when the backend fails to prepare for the grid.
    pub fn init(&mut self, grid: Arc<MazeGrid>, start_index: usize) -> Result<(), EngineError> {
        if !grid.contains(start_index) {
            return Err(EngineError::InvalidStart {
                index: start_index,
                reason: "out of bounds",
            });
        }
        if grid.is_wall(start_index) {
            return Err(EngineError::InvalidStart {
                index: start_index,
                reason: "start cell is a wall",
            });
        }

        let frontier = FrontierState::seeded(&grid, start_index);
        self.dispatch.prepare(&grid, frontier.capacity())?;
        info!(
            "Frontier engine initialized on {}x{} grid from cell {} (capacity {}, backend {})",
            grid.width(),
            grid.height(),
            start_index,
            frontier.capacity(),
            self.dispatch.name()
        );
        self.seen = bitvec![0; grid.len()];
        self.frontier = frontier;
        self.grid = Some(grid);
        self.start_index = start_index;
        self.found_at_step = None;
        self.state = EngineState::Expanding;
        Ok(())
    }

    /// Expands the frontier by one step towards `target_index`.
    ///
    /// # Errors
    ///
    /// * [`EngineError::NotExpanding`] outside the `Expanding` state.
    /// * [`EngineError::InvalidTarget`] when the target is outside the grid.
    /// * [`EngineError::Consistency`] when the dispatch breaks its contract.
    /// * [`EngineError::Dispatch`] when the backend fails.
    ///
    /// The last two move the engine to `Failed`; only `init` leaves it.
    pub fn step(&mut self, target_index: usize) -> Result<StepOutcome, EngineError> {
        if self.state != EngineState::Expanding {
            return Err(EngineError::NotExpanding(self.state));
        }
        let Some(grid) = self.grid.clone() else {
            return Err(EngineError::NotExpanding(self.state));
        };
        if !grid.contains(target_index) {
            return Err(EngineError::InvalidTarget {
                index: target_index,
                cells: grid.len(),
            });
        }

        let outcome = {
            let state = &mut self.frontier;
            self.dispatch.dispatch(DispatchArgs {
                width: grid.width(),
                height: grid.height(),
                frontier_size: state.current_frontier_size,
                costs: grid.costs(),
                prev_frontier: &state.prev_frontier,
                next_frontier: &mut state.next_frontier,
                distances: &mut state.distances,
                target_index,
            })
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Dispatch failed at step {}: {}", self.frontier.step_count + 1, err);
                self.state = EngineState::Failed;
                return Err(err.into());
            }
        };

        if outcome.found {
            if self.frontier.distances[target_index] == SENTINEL {
                error!("Found flag raised for undiscovered target {}", target_index);
                self.state = EngineState::Failed;
                return Err(EngineConsistencyError::InconsistentFoundFlag {
                    target: target_index,
                }
                .into());
            }
            self.frontier.step_count += 1;
            self.frontier.found_flag = true;
            self.found_at_step = Some(self.frontier.step_count);
            self.state = EngineState::Found;
            info!(
                "Target {} found at step {} (distance {})",
                target_index, self.frontier.step_count, self.frontier.distances[target_index]
            );
            return Ok(StepOutcome::Found);
        }

        let size = match self.compact_next_frontier(&grid) {
            Ok(size) => size,
            Err(err) => {
                self.state = EngineState::Failed;
                self.frontier.current_frontier_size = 0;
                return Err(err.into());
            }
        };
        self.frontier.step_count += 1;
        self.frontier.current_frontier_size = size;
        self.frontier.peak_frontier_size = self.frontier.peak_frontier_size.max(size);
        debug!(
            "Step {}: frontier size {}",
            self.frontier.step_count, size
        );

        if size == 0 {
            self.state = EngineState::Exhausted;
            info!(
                "Frontier exhausted after {} steps - no path to {}",
                self.frontier.step_count, target_index
            );
            return Ok(StepOutcome::NoPath);
        }
        Ok(StepOutcome::Continue)
    }

    /// Moves the non-sentinel entries of the next frontier, in order, into the
    /// previous frontier and resets the next frontier to all sentinel.
    fn compact_next_frontier(&mut self, grid: &MazeGrid) -> Result<usize, EngineConsistencyError> {
        let state = &mut self.frontier;
        let capacity = state.prev_frontier.len();
        state.prev_frontier.fill(SENTINEL);

        let mut size = 0;
        let mut result = Ok(());
        for &cell in &state.next_frontier {
            if cell == SENTINEL {
                continue;
            }
            if let Err(err) = validate_entry(grid, &state.distances, &self.seen, cell) {
                result = Err(err);
                break;
            }
            if size == capacity {
                result = Err(EngineConsistencyError::FrontierOverflow {
                    required: size + 1,
                    capacity,
                });
                break;
            }
            self.seen.set(cell as usize, true);
            state.prev_frontier[size] = cell;
            size += 1;
        }

        for &cell in &state.prev_frontier[..size] {
            self.seen.set(cell as usize, false);
        }
        state.next_frontier.fill(SENTINEL);
        trace!("Compacted next frontier into {} entries", size);

        if let Err(err) = result {
            error!("Accelerator contract violation: {}", err);
            return Err(err);
        }
        Ok(size)
    }

    pub const fn state(&self) -> EngineState {
        self.state
    }

    pub const fn frontier(&self) -> &FrontierState {
        &self.frontier
    }

    pub fn distances(&self) -> &[i32] {
        &self.frontier.distances
    }

    pub const fn step_count(&self) -> u64 {
        self.frontier.step_count
    }

    /// Step at which the target was reached, if it was.
    pub const fn found_at_step(&self) -> Option<u64> {
        self.found_at_step
    }

    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// The grid of the current run, if initialized.
    pub const fn grid(&self) -> Option<&Arc<MazeGrid>> {
        self.grid.as_ref()
    }

    pub fn backend_name(&self) -> &str {
        self.dispatch.name()
    }
}

fn validate_entry(
    grid: &MazeGrid,
    distances: &[i32],
    seen: &BitSlice,
    cell: i32,
) -> Result<(), EngineConsistencyError> {
    let Ok(index) = usize::try_from(cell) else {
        return Err(EngineConsistencyError::InvalidFrontierEntry {
            cell,
            reason: "negative index",
        });
    };
    if !grid.contains(index) {
        return Err(EngineConsistencyError::InvalidFrontierEntry {
            cell,
            reason: "out of bounds",
        });
    }
    if grid.is_wall(index) {
        return Err(EngineConsistencyError::InvalidFrontierEntry {
            cell,
            reason: "wall cell",
        });
    }
    if distances[index] == SENTINEL {
        return Err(EngineConsistencyError::InvalidFrontierEntry {
            cell,
            reason: "undiscovered cell",
        });
    }
    if seen[index] {
        return Err(EngineConsistencyError::DuplicateFrontierEntry { cell });
    }
    Ok(())
}
