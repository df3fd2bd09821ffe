use crate::grid::{MazeGrid, SENTINEL};
use log::{debug, trace, warn};
use std::sync::Arc;
use thiserror::Error;

/// Path mark for a cell nobody has claimed.
pub const UNMARKED: u8 = 0;
/// Reserved marker value; never written by the reconstruction itself.
pub const RESERVED: u8 = 1;
/// Path mark for a cell on the reconstructed path.
pub const ON_PATH: u8 = 2;

/// No neighbor of the cursor qualifies as the next hop before the start was reached.
///
/// Signals an inconsistent distance field. Callers treat it as a non-fatal halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Backtracking stuck at cell {index} (distance {distance}) before reaching the start")]
pub struct BacktrackStuck {
    pub index: usize,
    pub distance: i32,
}

/// Result of one [`Backtracker::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktrackStep {
    /// No reconstruction is in progress.
    Idle,
    /// The cursor moved to `index`.
    Advanced { index: usize, distance: i32 },
    /// The cursor is on the start cell; `length` counts every path cell.
    Complete { length: usize },
}

/// Path marks and the reconstruction cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktrackState {
    visited_for_path: Vec<u8>,
    current_index: usize,
    current_distance: i32,
    path: Vec<usize>,
}

impl BacktrackState {
    /// One marker per grid cell, see [`ON_PATH`].
    pub fn visited_for_path(&self) -> &[u8] {
        &self.visited_for_path
    }

    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    pub const fn current_distance(&self) -> i32 {
        self.current_distance
    }

    /// Cells visited so far, target first.
    pub fn path(&self) -> &[usize] {
        &self.path
    }
}

/// Walks a finalized distance field back from the target to the start, one hop per step.
///
/// Neighbors are scanned left, right, up, down. The first neighbor that is open,
/// unmarked and has a distance in `0..=current` wins, so among equal candidates the
/// path is reproducible but not canonical.
#[derive(Debug, Default)]
pub struct Backtracker {
    grid: Option<Arc<MazeGrid>>,
    state: Option<BacktrackState>,
    start_index: usize,
    complete: bool,
    stuck: Option<BacktrackStuck>,
}

impl Backtracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the cursor on `target_index` and marks it.
    ///
    /// # Errors
    ///
    /// Returns [`BacktrackStuck`] when the target has no finalized distance, lies
    /// outside the grid, or `distances` does not cover exactly the grid.
    pub fn start(
        &mut self,
        grid: Arc<MazeGrid>,
        distances: &[i32],
        start_index: usize,
        target_index: usize,
    ) -> Result<(), BacktrackStuck> {
        self.reset();
        let distance = if grid.contains(target_index) && distances.len() == grid.len() {
            distances[target_index]
        } else {
            SENTINEL
        };
        if distance < 0 {
            let stuck = BacktrackStuck {
                index: target_index,
                distance,
            };
            self.stuck = Some(stuck);
            return Err(stuck);
        }

        let mut visited_for_path = vec![UNMARKED; grid.len()];
        visited_for_path[target_index] = ON_PATH;
        self.state = Some(BacktrackState {
            visited_for_path,
            current_index: target_index,
            current_distance: distance,
            path: vec![target_index],
        });
        self.grid = Some(grid);
        self.start_index = start_index;
        self.complete = target_index == start_index;
        debug!(
            "Backtracking from {} (distance {}) to {}",
            target_index, distance, start_index
        );
        Ok(())
    }

    /// Moves the cursor one hop towards the start.
    ///
    /// # Errors
    ///
    /// Returns [`BacktrackStuck`] when no neighbor qualifies. The error repeats on
    /// every later call until the next [`Backtracker::start`].
    pub fn step(&mut self, distances: &[i32]) -> Result<BacktrackStep, BacktrackStuck> {
        if let Some(stuck) = self.stuck {
            return Err(stuck);
        }
        let (Some(grid), Some(state)) = (self.grid.as_ref(), self.state.as_mut()) else {
            return Ok(BacktrackStep::Idle);
        };
        if self.complete {
            return Ok(BacktrackStep::Complete {
                length: state.path.len(),
            });
        }

        let current = state.current_index;
        let next = grid.neighbors(current).find(|&n| {
            let d = distances.get(n).copied().unwrap_or(SENTINEL);
            !grid.is_wall(n)
                && state.visited_for_path[n] != ON_PATH
                && d >= 0
                && d <= state.current_distance
        });

        let Some(next) = next else {
            let stuck = BacktrackStuck {
                index: current,
                distance: state.current_distance,
            };
            warn!("{}", stuck);
            self.stuck = Some(stuck);
            return Err(stuck);
        };

        state.visited_for_path[next] = ON_PATH;
        state.current_index = next;
        state.current_distance = distances[next];
        state.path.push(next);
        trace!("Backtrack hop {} -> {} (distance {})", current, next, state.current_distance);

        if next == self.start_index {
            self.complete = true;
            debug!("Path reconstructed with {} cells", state.path.len());
            return Ok(BacktrackStep::Complete {
                length: state.path.len(),
            });
        }
        Ok(BacktrackStep::Advanced {
            index: next,
            distance: state.current_distance,
        })
    }

    /// Drops any reconstruction in progress.
    pub fn reset(&mut self) {
        self.grid = None;
        self.state = None;
        self.complete = false;
        self.stuck = None;
    }

    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    pub const fn is_stuck(&self) -> bool {
        self.stuck.is_some()
    }

    pub const fn is_active(&self) -> bool {
        self.state.is_some() && !self.complete && self.stuck.is_none()
    }

    pub const fn state(&self) -> Option<&BacktrackState> {
        self.state.as_ref()
    }

    /// Cells of the reconstructed path so far, target first.
    pub fn path(&self) -> &[usize] {
        self.state.as_ref().map(BacktrackState::path).unwrap_or_default()
    }
}
