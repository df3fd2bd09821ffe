use wfp_core::{GenerationError, RawMaze, RAW_OPEN, RAW_WALL};

/// Smallest side length that holds one open cell inside a wall border.
pub const MIN_MAZE_SIZE: usize = 3;

/// A square all-wall lattice with every odd/odd cell open, the starting point
/// of both carving algorithms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    size: usize,
    cells: Vec<u8>,
}

impl Lattice {
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidSize`] below [`MIN_MAZE_SIZE`].
    pub fn new(size: usize) -> Result<Self, GenerationError> {
        if size < MIN_MAZE_SIZE {
            return Err(GenerationError::InvalidSize(size));
        }
        let mut cells = vec![RAW_WALL; size * size];
        for y in (1..size).step_by(2) {
            for x in (1..size).step_by(2) {
                cells[y * size + x] = RAW_OPEN;
            }
        }
        Ok(Self { size, cells })
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    /// Coordinates of the open lattice cells, row by row.
    pub fn rooms(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.size)
            .step_by(2)
            .flat_map(move |y| (1..self.size).step_by(2).map(move |x| (x, y)))
    }

    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn open(&mut self, x: usize, y: usize) {
        self.cells[y * self.size + x] = RAW_OPEN;
    }

    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.size + x] == RAW_OPEN
    }

    pub fn into_raw(self) -> RawMaze {
        RawMaze::square(self.size, self.cells)
    }
}
