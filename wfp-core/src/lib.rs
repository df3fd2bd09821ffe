//! Core library for host-orchestrated wavefront pathfinding on a weighted grid maze.
//! Defines the cost model, the frontier state machine that drives accelerator
//! dispatches, path reconstruction and the run lifecycle.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path reconstruction from a finalized distance field.
pub mod backtrack;
/// Per-cell traversal cost encoding built from a raw wall bitmap.
pub mod cost;
/// Accelerator dispatch contract and the CPU reference implementation.
pub mod dispatch;
/// Frontier buffers and the expansion state machine.
pub mod frontier;
/// The maze grid and index helpers.
pub mod grid;
/// Read-only display mirror fed by one-directional publishes.
pub mod mirror;
/// Tick-driven run lifecycle.
pub mod runner;
/// Generator collaborator contract and raw bitmaps.
pub mod source;

pub use crate::backtrack::{BacktrackState, BacktrackStep, BacktrackStuck, Backtracker};
pub use crate::cost::{CostMode, CostModel, GenerationError};
pub use crate::dispatch::{
    cpu::CpuWavefrontDispatch, DispatchArgs, DispatchError, DispatchOutcome, WavefrontDispatch,
};
pub use crate::frontier::{
    EngineConsistencyError, EngineError, EngineState, FrontierEngine, FrontierState, StepOutcome,
};
pub use crate::grid::{frontier_capacity, MazeGrid, SENTINEL, WALL};
pub use crate::mirror::DisplayMirror;
pub use crate::runner::{RunConfig, RunController, RunError, RunPhase, RunSummary, TickOutcome};
pub use crate::source::{FixedMazeSource, MazeSource, RawMaze, RAW_OPEN, RAW_WALL};

/// Maze layout algorithms understood by the generator collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum MazeAlgorithm {
    /// Randomized Kruskal over the odd-coordinate lattice.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "kruskal"))]
    Kruskal,
    /// Iterative randomized depth-first carving from (1, 1).
    #[cfg_attr(feature = "serde", serde(rename = "depthfs", alias = "depth-first"))]
    #[cfg_attr(feature = "clap", value(name = "depthfs", alias = "depth-first"))]
    DepthFirst,
}

impl MazeAlgorithm {
    /// The name handed to external generator processes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kruskal => "kruskal",
            Self::DepthFirst => "depthfs",
        }
    }
}

impl fmt::Display for MazeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MazeAlgorithm {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kruskal" => Ok(Self::Kruskal),
            "depthfs" | "depth-first" | "dfs" => Ok(Self::DepthFirst),
            other => Err(GenerationError::UnknownAlgorithm(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_through_from_str() {
        assert_eq!("kruskal".parse::<MazeAlgorithm>().unwrap(), MazeAlgorithm::Kruskal);
        assert_eq!("DepthFS".parse::<MazeAlgorithm>().unwrap(), MazeAlgorithm::DepthFirst);
        assert_eq!(MazeAlgorithm::DepthFirst.to_string(), "depthfs");
        assert!(matches!(
            "prim".parse::<MazeAlgorithm>(),
            Err(GenerationError::UnknownAlgorithm(name)) if name == "prim"
        ));
    }
}
