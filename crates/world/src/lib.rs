//! Voxel world: grid storage, terrain generation, and render-batch visibility sync.

mod batch;
mod block;
mod error;
mod grid;
mod heightmap;
mod noise;
mod raycast;
mod registry;
mod terrain;
mod visibility;
mod world;

pub use batch::*;
pub use block::*;
pub use error::*;
pub use grid::*;
pub use heightmap::*;
pub use self::noise::*;
pub use raycast::*;
pub use registry::*;
pub use terrain::*;
pub use visibility::*;
pub use world::*;
