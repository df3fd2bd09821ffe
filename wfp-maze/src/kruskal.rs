use crate::lattice::Lattice;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use wfp_core::{GenerationError, RawMaze};

/// Union-find over lattice rooms with path compression.
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    /// Joins the sets of `a` and `b`. Returns false if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}

/// A removable wall at `wall` that would join rooms `a` and `b` (flat indices).
#[derive(Debug, Clone, Copy)]
struct Edge {
    wall: (usize, usize),
    a: usize,
    b: usize,
}

/// Carves a perfect maze by processing the lattice walls in random order and removing
/// each one that joins two still-disconnected rooms.
pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<RawMaze, GenerationError> {
    let mut lattice = Lattice::new(size)?;
    let idx = |x: usize, y: usize| y * size + x;

    let mut edges = Vec::new();
    for (x, y) in lattice.rooms() {
        if x + 2 < size {
            edges.push(Edge {
                wall: (x + 1, y),
                a: idx(x, y),
                b: idx(x + 2, y),
            });
        }
        if y + 2 < size {
            edges.push(Edge {
                wall: (x, y + 1),
                a: idx(x, y),
                b: idx(x, y + 2),
            });
        }
    }
    edges.shuffle(rng);

    let mut sets = DisjointSet::new(size * size);
    let mut removed = 0usize;
    for edge in &edges {
        if sets.union(edge.a, edge.b) {
            lattice.open(edge.wall.0, edge.wall.1);
            removed += 1;
        }
    }
    debug!(
        "Kruskal maze {}x{}: removed {} of {} candidate walls",
        size,
        size,
        removed,
        edges.len()
    );
    Ok(lattice.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wfp_core::RAW_OPEN;

    #[test]
    fn test_perfect_maze_opens_rooms_minus_one_walls() {
        let size = 11;
        let raw = generate(size, &mut StdRng::seed_from_u64(9)).unwrap();
        let rooms = 5 * 5;
        let open = raw.cells.iter().filter(|&&c| c == RAW_OPEN).count();
        assert_eq!(open, rooms + rooms - 1);
    }

    #[test]
    fn test_border_stays_closed_for_odd_sizes() {
        let size = 9;
        let raw = generate(size, &mut StdRng::seed_from_u64(1)).unwrap();
        for i in 0..size {
            assert_ne!(raw.cells[raw.index(i, 0)], RAW_OPEN);
            assert_ne!(raw.cells[raw.index(0, i)], RAW_OPEN);
            assert_ne!(raw.cells[raw.index(i, size - 1)], RAW_OPEN);
            assert_ne!(raw.cells[raw.index(size - 1, i)], RAW_OPEN);
        }
    }

    #[test]
    fn test_same_seed_same_maze() {
        let a = generate(15, &mut StdRng::seed_from_u64(4)).unwrap();
        let b = generate(15, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_union_find() {
        let mut sets = DisjointSet::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(!sets.union(1, 0));
        assert!(sets.union(1, 3));
        assert_eq!(sets.find(0), sets.find(2));
    }
}
