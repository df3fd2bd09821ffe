use crate::{depth_first, kruskal};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wfp_core::{GenerationError, MazeAlgorithm, MazeSource, RawMaze};

/// In-process generator for both supported layouts.
#[derive(Debug)]
pub struct BuiltinGenerator {
    rng: StdRng,
}

impl BuiltinGenerator {
    /// Seeded from entropy; every maze differs.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Produces the same sequence of mazes for the same seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for BuiltinGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MazeSource for BuiltinGenerator {
    fn generate(
        &mut self,
        size: usize,
        algorithm: MazeAlgorithm,
    ) -> Result<RawMaze, GenerationError> {
        let raw = match algorithm {
            MazeAlgorithm::Kruskal => kruskal::generate(size, &mut self.rng)?,
            MazeAlgorithm::DepthFirst => depth_first::generate(size, &mut self.rng)?,
        };
        info!("Generated {}x{} maze with {}", size, size, algorithm);
        Ok(raw)
    }
}
