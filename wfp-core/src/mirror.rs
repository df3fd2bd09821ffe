use crate::grid::{MazeGrid, SENTINEL};

/// A render-side snapshot of the run.
///
/// Filled only through [`DisplayMirror::publish`]; nothing here flows back into the
/// cost model or the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayMirror {
    width: usize,
    height: usize,
    costs: Vec<i32>,
    distances: Vec<i32>,
    path_marks: Vec<u8>,
    max_distance: i32,
    revision: u64,
}

impl DisplayMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the authoritative state into the mirror.
    ///
    /// `path_marks` may be `None` before backtracking starts, which clears the marks.
    pub fn publish(&mut self, grid: &MazeGrid, distances: &[i32], path_marks: Option<&[u8]>) {
        if self.width != grid.width() || self.height != grid.height() || self.costs != grid.costs()
        {
            self.width = grid.width();
            self.height = grid.height();
            self.costs.clear();
            self.costs.extend_from_slice(grid.costs());
        }
        self.distances.clear();
        self.distances.extend_from_slice(distances);
        self.path_marks.clear();
        match path_marks {
            Some(marks) => self.path_marks.extend_from_slice(marks),
            None => self.path_marks.resize(grid.len(), 0),
        }
        self.max_distance = distances.iter().copied().max().unwrap_or(SENTINEL);
        self.revision += 1;
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn costs(&self) -> &[i32] {
        &self.costs
    }

    pub fn distances(&self) -> &[i32] {
        &self.distances
    }

    pub fn path_marks(&self) -> &[u8] {
        &self.path_marks
    }

    /// Largest finalized distance, used to normalize color ramps. `-1` when empty.
    pub const fn max_distance(&self) -> i32 {
        self.max_distance
    }

    /// Number of publishes so far.
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}
