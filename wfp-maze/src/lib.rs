//! Maze generator collaborators for the wavefront pathfinder.
//!
//! Every generator produces the flat row-major bitmap understood by
//! [`wfp_core::CostModel::build`]: `size * size` bytes, 0 for open and 1 for wall.

pub mod depth_first;
pub mod external;
pub mod generator;
pub mod kruskal;
pub mod lattice;
pub mod loader;

pub use external::{ExternalCommand, ExternalGenerator, DEFAULT_ARTIFACT};
pub use generator::BuiltinGenerator;
pub use lattice::{Lattice, MIN_MAZE_SIZE};
pub use loader::{load_bitmap, save_bitmap, BitmapSource};
