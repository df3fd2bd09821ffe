//! The accelerator dispatch contract.
//!
//! One dispatch expands the current frontier by one step. The host guarantees:
//! `prev_frontier[..frontier_size]` holds valid cell indices, `next_frontier` is all
//! [`SENTINEL`](crate::grid::SENTINEL) and `distances` is authoritative.
//!
//! Implementations must guarantee:
//! * a cell is written to `next_frontier` only if its distance was `-1`
//!   immediately before (first discovery wins);
//! * concurrent claims on one cell produce exactly one effective write;
//! * `found` is set if and only if the target was newly discovered or was already
//!   a member of the dispatched frontier.
//!
//! The host does not trust these properties blindly: see
//! [`EngineConsistencyError`](crate::frontier::EngineConsistencyError).

use crate::grid::MazeGrid;
use std::fmt::Debug;
use thiserror::Error;

pub mod cpu;

/// Errors reported by a dispatch implementation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The next frontier needs more slots than the buffers provide.
    #[error("Next frontier needs {required} slots but capacity is {capacity}")]
    FrontierOverflow { required: usize, capacity: usize },
    /// A buffer handed to the dispatch has the wrong length.
    #[error("Buffer '{name}' has length {actual}, expected {expected}")]
    BufferSizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    /// `dispatch` was called before `prepare`.
    #[error("Dispatch used before being prepared for a grid")]
    NotPrepared,
    /// Backend-specific failure (device lost, mapping failed, ...).
    #[error("Accelerator backend error: {0}")]
    Backend(String),
}

/// Inputs and in/out buffers for one expansion step.
#[derive(Debug)]
pub struct DispatchArgs<'a> {
    pub width: usize,
    pub height: usize,
    /// Number of valid entries at the front of `prev_frontier`.
    pub frontier_size: usize,
    pub costs: &'a [i32],
    pub prev_frontier: &'a [i32],
    /// Output; all sentinel on entry.
    pub next_frontier: &'a mut [i32],
    /// In/out distance field.
    pub distances: &'a mut [i32],
    pub target_index: usize,
}

impl DispatchArgs<'_> {
    /// Checks the buffer lengths against the grid dimensions.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let cells = self.width * self.height;
        check_len("costs", cells, self.costs.len())?;
        check_len("distances", cells, self.distances.len())?;
        check_len(
            "next_frontier",
            self.prev_frontier.len(),
            self.next_frontier.len(),
        )?;
        if self.frontier_size > self.prev_frontier.len() {
            return Err(DispatchError::BufferSizeMismatch {
                name: "prev_frontier",
                expected: self.frontier_size,
                actual: self.prev_frontier.len(),
            });
        }
        Ok(())
    }
}

const fn check_len(name: &'static str, expected: usize, actual: usize) -> Result<(), DispatchError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DispatchError::BufferSizeMismatch {
            name,
            expected,
            actual,
        })
    }
}

/// What the host reads back after a dispatch besides the mutated buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// The single-byte found flag.
    pub found: bool,
}

/// A data-parallel executor of one wavefront expansion step.
///
/// From the host's point of view every call is synchronous and blocking:
/// dispatch, then read back. Calls never overlap.
pub trait WavefrontDispatch: Send + Debug {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// Called once per run (on `init`) before any dispatch for `grid`.
    ///
    /// Backends that keep device-side copies of the cost grid upload it here.
    fn prepare(&mut self, grid: &MazeGrid, capacity: usize) -> Result<(), DispatchError> {
        let _ = (grid, capacity);
        Ok(())
    }

    /// Runs one expansion step.
    fn dispatch(&mut self, args: DispatchArgs<'_>) -> Result<DispatchOutcome, DispatchError>;
}

impl<T: WavefrontDispatch + ?Sized> WavefrontDispatch for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn prepare(&mut self, grid: &MazeGrid, capacity: usize) -> Result<(), DispatchError> {
        (**self).prepare(grid, capacity)
    }

    fn dispatch(&mut self, args: DispatchArgs<'_>) -> Result<DispatchOutcome, DispatchError> {
        (**self).dispatch(args)
    }
}
