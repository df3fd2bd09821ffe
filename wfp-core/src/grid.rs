/// Cost entry marking an impassable cell.
pub const WALL: i32 = -1;

/// Marks an unused frontier slot or an undiscovered distance.
pub const SENTINEL: i32 = -1;

/// Axis-aligned neighbor offsets in the fixed scan order: left, right, up, down.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Upper bound on the number of frontier slots for a `width` x `height` grid.
///
/// `4 * 2 * (max(width, height) - 1)`, clamped so a 1x1 grid still holds its start cell.
pub fn frontier_capacity(width: usize, height: usize) -> usize {
    4 * 2 * width.max(height).saturating_sub(1).max(1)
}

/// A row-major 4-connected grid of traversal costs.
///
/// Each entry is either [`WALL`] or a cost in `1..=255`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    costs: Vec<i32>,
}

impl MazeGrid {
    /// Wraps a cost array. Returns `None` when the length does not match the dimensions.
    pub fn from_costs(width: usize, height: usize, costs: Vec<i32>) -> Option<Self> {
        if width == 0 || height == 0 || costs.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            costs,
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// The raw cost array, row-major.
    pub fn costs(&self) -> &[i32] {
        &self.costs
    }

    /// Slot count of each frontier buffer for this grid.
    pub fn frontier_capacity(&self) -> usize {
        frontier_capacity(self.width, self.height)
    }

    /// Calculates the row-major index for `(x, y)`, or `None` when out of bounds.
    pub const fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Inverse of [`MazeGrid::index`].
    pub const fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.costs.len()
    }

    /// True for walls and for out-of-range indices.
    pub fn is_wall(&self, index: usize) -> bool {
        self.costs.get(index).map_or(true, |&c| c < 0)
    }

    /// Traversal cost of an open cell.
    pub fn cost(&self, index: usize) -> Option<i32> {
        self.costs.get(index).copied().filter(|&c| c > 0)
    }

    /// Number of open cells.
    pub fn open_cells(&self) -> usize {
        self.costs.iter().filter(|&&c| c > 0).count()
    }

    /// In-bounds neighbors of `index` in the fixed scan order (left, right, up, down).
    ///
    /// Walls are included; callers decide what is traversable.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (x, y) = self.coords(index);
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            self.index(nx, ny)
        })
    }
}
