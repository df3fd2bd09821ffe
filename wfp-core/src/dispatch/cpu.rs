use super::{DispatchArgs, DispatchError, DispatchOutcome, WavefrontDispatch};
use crate::grid::{NEIGHBOR_OFFSETS, SENTINEL};
use log::trace;
use rayon::prelude::*;

/// Output slots owned by each frontier work item (one per neighbor direction).
pub const SLOTS_PER_CELL: usize = NEIGHBOR_OFFSETS.len();

/// Frontier size from which the expansion runs on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// Host-side implementation of the dispatch contract.
///
/// Work item `i` expands `prev_frontier[i]` and owns output slots
/// `4i..4i+4` (left, right, up, down). Candidate claims are computed in parallel
/// against a read-only view of the distance field, then resolved in slot order,
/// so the lowest slot wins a contested cell and the result is deterministic.
#[derive(Debug, Clone)]
pub struct CpuWavefrontDispatch {
    parallel_threshold: usize,
    candidate_distances: Vec<i32>,
}

impl Default for CpuWavefrontDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuWavefrontDispatch {
    pub fn new() -> Self {
        Self::with_parallel_threshold(DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Frontiers smaller than `threshold` are expanded on the calling thread.
    pub fn with_parallel_threshold(threshold: usize) -> Self {
        Self {
            parallel_threshold: threshold.max(1),
            candidate_distances: Vec::new(),
        }
    }

    pub const fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}

/// Writes undiscovered, non-wall neighbors of `cell` into its four slots.
fn expand_cell(
    cell: i32,
    width: usize,
    height: usize,
    costs: &[i32],
    distances: &[i32],
    slots: &mut [i32],
    candidates: &mut [i32],
) {
    let Ok(cell) = usize::try_from(cell) else {
        return;
    };
    let Some(&base) = distances.get(cell) else {
        return;
    };
    let (x, y) = (cell % width, cell / width);
    for (dir, &(dx, dy)) in NEIGHBOR_OFFSETS.iter().enumerate() {
        let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
            continue;
        };
        if nx >= width || ny >= height {
            continue;
        }
        let neighbor = ny * width + nx;
        let cost = costs[neighbor];
        if cost < 0 || distances[neighbor] != SENTINEL {
            continue;
        }
        slots[dir] = neighbor as i32;
        candidates[dir] = base.saturating_add(cost);
    }
}

impl WavefrontDispatch for CpuWavefrontDispatch {
    fn name(&self) -> &str {
        "cpu"
    }

    fn dispatch(&mut self, args: DispatchArgs<'_>) -> Result<DispatchOutcome, DispatchError> {
        args.validate()?;
        let DispatchArgs {
            width,
            height,
            frontier_size,
            costs,
            prev_frontier,
            next_frontier,
            distances,
            target_index,
        } = args;

        let required = frontier_size * SLOTS_PER_CELL;
        if required > next_frontier.len() {
            return Err(DispatchError::FrontierOverflow {
                required,
                capacity: next_frontier.len(),
            });
        }

        let frontier = &prev_frontier[..frontier_size];
        let target = target_index as i32;
        let mut found = frontier.contains(&target);

        self.candidate_distances.clear();
        self.candidate_distances.resize(required, SENTINEL);
        {
            let read_only: &[i32] = &*distances;
            let slots = &mut next_frontier[..required];
            let candidates = &mut self.candidate_distances[..];
            if frontier_size >= self.parallel_threshold {
                slots
                    .par_chunks_mut(SLOTS_PER_CELL)
                    .zip(candidates.par_chunks_mut(SLOTS_PER_CELL))
                    .zip(frontier.par_iter())
                    .for_each(|((s, c), &cell)| {
                        expand_cell(cell, width, height, costs, read_only, s, c);
                    });
            } else {
                slots
                    .chunks_mut(SLOTS_PER_CELL)
                    .zip(candidates.chunks_mut(SLOTS_PER_CELL))
                    .zip(frontier.iter())
                    .for_each(|((s, c), &cell)| {
                        expand_cell(cell, width, height, costs, read_only, s, c);
                    });
            }
        }

        // First discovery wins, in slot order.
        let mut claimed = 0usize;
        for slot in 0..required {
            let neighbor = next_frontier[slot];
            if neighbor == SENTINEL {
                continue;
            }
            let index = neighbor as usize;
            if distances[index] == SENTINEL {
                distances[index] = self.candidate_distances[slot];
                claimed += 1;
                if neighbor == target {
                    found = true;
                }
            } else {
                next_frontier[slot] = SENTINEL;
            }
        }
        trace!(
            "CPU dispatch expanded {} cells, claimed {}, found={}",
            frontier_size,
            claimed,
            found
        );

        Ok(DispatchOutcome { found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Buffers {
        costs: Vec<i32>,
        prev: Vec<i32>,
        next: Vec<i32>,
        distances: Vec<i32>,
    }

    impl Buffers {
        fn open(width: usize, height: usize, capacity: usize, frontier: &[i32], dist: &[(usize, i32)]) -> Self {
            let mut prev = vec![SENTINEL; capacity];
            prev[..frontier.len()].copy_from_slice(frontier);
            let mut distances = vec![SENTINEL; width * height];
            for &(cell, d) in dist {
                distances[cell] = d;
            }
            Self {
                costs: vec![1; width * height],
                prev,
                next: vec![SENTINEL; capacity],
                distances,
            }
        }

        fn run(
            &mut self,
            dispatch: &mut CpuWavefrontDispatch,
            width: usize,
            height: usize,
            frontier_size: usize,
            target: usize,
        ) -> Result<DispatchOutcome, DispatchError> {
            dispatch.dispatch(DispatchArgs {
                width,
                height,
                frontier_size,
                costs: &self.costs,
                prev_frontier: &self.prev,
                next_frontier: &mut self.next,
                distances: &mut self.distances,
                target_index: target,
            })
        }
    }

    #[test]
    fn test_single_cell_expands_in_scan_order() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(3, 3, 16, &[4], &[(4, 0)]);
        let outcome = buffers.run(&mut dispatch, 3, 3, 1, 0).unwrap();
        assert!(!outcome.found);
        assert_eq!(&buffers.next[..4], &[3, 5, 1, 7]);
        for cell in [1, 3, 5, 7] {
            assert_eq!(buffers.distances[cell], 1);
        }
        assert_eq!(buffers.distances[0], SENTINEL);
    }

    #[test]
    fn test_contested_cell_goes_to_lowest_slot() {
        // Cells 0 and 2 both neighbor 1 on a 3x1 strip.
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(3, 1, 16, &[0, 2], &[(0, 0), (2, 0)]);
        buffers.run(&mut dispatch, 3, 1, 2, 9).unwrap();
        let claims: Vec<_> = buffers.next.iter().filter(|&&c| c != SENTINEL).collect();
        assert_eq!(claims, vec![&1]);
        // Slot 1 is "right of cell 0".
        assert_eq!(buffers.next[1], 1);
        assert_eq!(buffers.distances[1], 1);
    }

    #[test]
    fn test_walls_are_never_claimed() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(3, 1, 16, &[0], &[(0, 0)]);
        buffers.costs[1] = -1;
        buffers.run(&mut dispatch, 3, 1, 1, 2).unwrap();
        assert!(buffers.next.iter().all(|&c| c == SENTINEL));
        assert_eq!(buffers.distances[1], SENTINEL);
    }

    #[test]
    fn test_target_in_frontier_sets_found() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(2, 1, 8, &[0], &[(0, 0)]);
        let outcome = buffers.run(&mut dispatch, 2, 1, 1, 0).unwrap();
        assert!(outcome.found);
    }

    #[test]
    fn test_newly_discovered_target_sets_found() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(2, 1, 8, &[0], &[(0, 0)]);
        let outcome = buffers.run(&mut dispatch, 2, 1, 1, 1).unwrap();
        assert!(outcome.found);
        assert_eq!(buffers.distances[1], 1);
    }

    #[test]
    fn test_weighted_candidate_adds_neighbor_cost() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(3, 1, 16, &[1], &[(1, 10)]);
        buffers.costs = vec![7, 1, 200];
        buffers.run(&mut dispatch, 3, 1, 1, 9).unwrap();
        assert_eq!(buffers.distances, vec![17, 10, 210]);
    }

    #[test]
    fn test_oversized_frontier_is_reported() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(3, 3, 4, &[0, 1], &[(0, 0), (1, 1)]);
        let err = buffers.run(&mut dispatch, 3, 3, 2, 8).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::FrontierOverflow {
                required: 8,
                capacity: 4
            }
        ));
    }

    #[test]
    fn test_parallel_and_sequential_paths_agree() {
        let width = 64;
        let frontier: Vec<i32> = (0..width as i32).map(|x| x + 31 * width as i32).collect();
        let dist: Vec<(usize, i32)> = frontier.iter().map(|&c| (c as usize, 5)).collect();
        let capacity = frontier.len() * SLOTS_PER_CELL;

        let mut sequential = CpuWavefrontDispatch::with_parallel_threshold(usize::MAX);
        let mut a = Buffers::open(width, width, capacity, &frontier, &dist);
        a.run(&mut sequential, width, width, frontier.len(), 0).unwrap();

        let mut parallel = CpuWavefrontDispatch::with_parallel_threshold(1);
        let mut b = Buffers::open(width, width, capacity, &frontier, &dist);
        b.run(&mut parallel, width, width, frontier.len(), 0).unwrap();

        assert_eq!(a.next, b.next);
        assert_eq!(a.distances, b.distances);
    }

    #[test]
    fn test_mismatched_buffers_are_rejected() {
        let mut dispatch = CpuWavefrontDispatch::new();
        let mut buffers = Buffers::open(3, 3, 16, &[4], &[(4, 0)]);
        buffers.distances.pop();
        assert!(matches!(
            buffers.run(&mut dispatch, 3, 3, 1, 0),
            Err(DispatchError::BufferSizeMismatch {
                name: "distances",
                ..
            })
        ));
    }
}
