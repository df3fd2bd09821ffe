use crate::lattice::Lattice;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use wfp_core::{GenerationError, RawMaze};

const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Carves a perfect maze with an iterative randomized depth-first walk from (1, 1).
pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<RawMaze, GenerationError> {
    let mut lattice = Lattice::new(size)?;
    let mut visited = vec![false; size * size];
    let mut stack = vec![(1usize, 1usize)];
    visited[size + 1] = true;
    let mut carved = 0usize;
    let mut directions = DIRECTIONS;

    while let Some(&(cx, cy)) = stack.last() {
        directions.shuffle(rng);
        let next = directions.iter().find_map(|&(dx, dy)| {
            let nx = cx.checked_add_signed(2 * dx)?;
            let ny = cy.checked_add_signed(2 * dy)?;
            (lattice.contains(nx, ny) && !visited[ny * size + nx]).then_some((nx, ny, dx, dy))
        });

        match next {
            Some((nx, ny, dx, dy)) => {
                // Both offsets are in -1..=1 and the room is in bounds, so the wall is too.
                let wx = cx.wrapping_add_signed(dx);
                let wy = cy.wrapping_add_signed(dy);
                lattice.open(wx, wy);
                visited[ny * size + nx] = true;
                stack.push((nx, ny));
                carved += 1;
            }
            None => {
                stack.pop();
            }
        }
    }
    debug!("Depth-first maze {}x{}: carved {} passages", size, size, carved);
    Ok(lattice.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use wfp_core::RAW_OPEN;

    fn reachable(raw: &RawMaze, from: (usize, usize)) -> usize {
        let size = raw.width;
        let mut seen = vec![false; raw.cells.len()];
        let mut queue = VecDeque::from([from]);
        seen[raw.index(from.0, from.1)] = true;
        let mut count = 0;
        while let Some((x, y)) = queue.pop_front() {
            count += 1;
            for (dx, dy) in DIRECTIONS {
                let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                    continue;
                };
                if nx < size && ny < size && !seen[raw.index(nx, ny)] && raw.cells[raw.index(nx, ny)] == RAW_OPEN {
                    seen[raw.index(nx, ny)] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
        count
    }

    #[test]
    fn test_every_open_cell_is_connected() {
        let raw = generate(21, &mut StdRng::seed_from_u64(2)).unwrap();
        let open = raw.cells.iter().filter(|&&c| c == RAW_OPEN).count();
        assert_eq!(reachable(&raw, (1, 1)), open);
        assert_eq!(open, 2 * 100 - 1);
    }

    #[test]
    fn test_smallest_maze() {
        let raw = generate(3, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(raw.cells.iter().filter(|&&c| c == RAW_OPEN).count(), 1);
    }
}
