//! The generator collaborator contract.
//!
//! A generator produces a flat, header-less, row-major byte array of
//! `size * size` cells with values in {0, 1}. Implementations live outside the
//! core (in-process generators, external processes, files).

use crate::{cost::GenerationError, MazeAlgorithm};
use std::fmt::Debug;

/// Raw bitmap value for an open cell.
pub const RAW_OPEN: u8 = 0;
/// Raw bitmap value for a wall.
pub const RAW_WALL: u8 = 1;

/// The unvalidated output of a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMaze {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<u8>,
}

impl RawMaze {
    pub fn new(width: usize, height: usize, cells: Vec<u8>) -> Self {
        Self {
            width,
            height,
            cells,
        }
    }

    /// A square bitmap as produced by the supported generators.
    pub fn square(size: usize, cells: Vec<u8>) -> Self {
        Self::new(size, size, cells)
    }

    /// Parses a fixture where `#` is a wall and any other character is open.
    ///
    /// Blank lines and surrounding whitespace are ignored. Rows must share one width.
    pub fn from_ascii(art: &str) -> Result<Self, GenerationError> {
        let rows: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(GenerationError::Empty);
        }
        let mut cells = Vec::with_capacity(width * rows.len());
        for row in &rows {
            if row.chars().count() != width {
                return Err(GenerationError::RaggedRows {
                    expected: width,
                    actual: row.chars().count(),
                });
            }
            cells.extend(
                row.chars()
                    .map(|c| if c == '#' { RAW_WALL } else { RAW_OPEN }),
            );
        }
        Ok(Self::new(width, rows.len(), cells))
    }

    /// Row-major index of `(x, y)` without bounds checking.
    pub const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// Source of raw maze bitmaps, invoked with `(size, algorithm)`.
pub trait MazeSource: Send + Debug {
    /// Produces a `size` x `size` bitmap.
    ///
    /// Process failures, missing artifacts and short artifacts are all
    /// reported as [`GenerationError`].
    fn generate(&mut self, size: usize, algorithm: MazeAlgorithm)
        -> Result<RawMaze, GenerationError>;
}

/// Replays one bitmap for every request, whatever size or algorithm is asked for.
#[derive(Debug, Clone)]
pub struct FixedMazeSource {
    maze: RawMaze,
}

impl FixedMazeSource {
    pub fn new(maze: RawMaze) -> Self {
        Self { maze }
    }

    pub const fn maze(&self) -> &RawMaze {
        &self.maze
    }
}

impl MazeSource for FixedMazeSource {
    fn generate(
        &mut self,
        _size: usize,
        _algorithm: MazeAlgorithm,
    ) -> Result<RawMaze, GenerationError> {
        Ok(self.maze.clone())
    }
}
