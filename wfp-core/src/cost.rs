use crate::grid::{MazeGrid, WALL};
use crate::source::{RawMaze, RAW_OPEN, RAW_WALL};
use log::{debug, info};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when a generator fails or hands back an unusable bitmap.
///
/// A run cannot start after any of these; callers must not proceed to `init`.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generator produced no cells at all.
    #[error("Generator produced an empty maze")]
    Empty,
    /// The bitmap does not hold exactly `width * height` cells.
    #[error("Generator produced {actual} cells, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    /// A cell holds something other than 0 (open) or 1 (wall).
    #[error("Invalid cell value {value} at index {index} (expected 0 or 1)")]
    InvalidCell { index: usize, value: u8 },
    /// Requested maze size cannot hold a maze.
    #[error("Invalid maze size {0}: generators need at least 3 cells per side")]
    InvalidSize(usize),
    /// Unknown layout algorithm name.
    #[error("No maze algorithm named '{0}'")]
    UnknownAlgorithm(String),
    /// ASCII fixture rows differ in width.
    #[error("Ragged maze rows: expected width {expected}, found {actual}")]
    RaggedRows { expected: usize, actual: usize },
    /// The generator process could not be started.
    #[error("Failed to launch generator '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The generator process exited unsuccessfully.
    #[error("Generator exited with status {status}")]
    ProcessFailed { status: String },
    /// The generator artifact was never written.
    #[error("Generator artifact {0:?} is missing")]
    MissingArtifact(PathBuf),
    /// Any other I/O failure while reading or writing a bitmap.
    #[error("I/O error on maze bitmap: {0}")]
    Io(#[from] std::io::Error),
}

/// How traversal costs are assigned to open cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CostMode {
    /// Every open cell costs 1.
    #[default]
    Uniform,
    /// Each open cell costs a value drawn uniformly from `1..=255`.
    Weighted,
}

/// Largest traversal cost in weighted mode.
pub const MAX_COST: i32 = 255;

/// Owns the maze's per-cell traversal cost encoding for one run.
///
/// The grid is shared behind an `Arc` so readers (the frontier engine, renderers)
/// see one authoritative, immutable copy.
#[derive(Debug, Clone)]
pub struct CostModel {
    grid: Arc<MazeGrid>,
    mode: CostMode,
}

impl CostModel {
    /// Builds the cost grid from a generator bitmap.
    ///
    /// Walls become [`WALL`]; open cells become 1 in uniform mode or a cost drawn
    /// from `rng` in weighted mode.
    ///
    /// # Errors
    ///
    /// * [`GenerationError::Empty`] if the bitmap has no cells.
    /// * [`GenerationError::SizeMismatch`] if it does not hold exactly `width * height` cells.
    /// * [`GenerationError::InvalidCell`] for bytes other than 0 or 1.
    pub fn build<R: Rng + ?Sized>(
        raw: &RawMaze,
        mode: CostMode,
        rng: &mut R,
    ) -> Result<Self, GenerationError> {
        if raw.cells.is_empty() || raw.width == 0 || raw.height == 0 {
            return Err(GenerationError::Empty);
        }
        let expected = raw.width * raw.height;
        if raw.cells.len() != expected {
            return Err(GenerationError::SizeMismatch {
                expected,
                actual: raw.cells.len(),
            });
        }

        let mut costs = Vec::with_capacity(expected);
        for (index, &value) in raw.cells.iter().enumerate() {
            let cost = match (value, mode) {
                (RAW_WALL, _) => WALL,
                (RAW_OPEN, CostMode::Uniform) => 1,
                (RAW_OPEN, CostMode::Weighted) => rng.gen_range(1..=MAX_COST),
                (value, _) => return Err(GenerationError::InvalidCell { index, value }),
            };
            costs.push(cost);
        }

        let grid = MazeGrid::from_costs(raw.width, raw.height, costs).ok_or(
            GenerationError::SizeMismatch {
                expected,
                actual: raw.cells.len(),
            },
        )?;
        info!(
            "Built {:?} cost model: {}x{}, {} open cells",
            mode,
            grid.width(),
            grid.height(),
            grid.open_cells()
        );
        debug!("Frontier capacity: {}", grid.frontier_capacity());
        Ok(Self {
            grid: Arc::new(grid),
            mode,
        })
    }

    /// A cheap shared handle to the cost grid.
    pub fn grid(&self) -> Arc<MazeGrid> {
        Arc::clone(&self.grid)
    }

    /// Borrowed view of the cost grid.
    pub fn as_grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub const fn mode(&self) -> CostMode {
        self.mode
    }
}
