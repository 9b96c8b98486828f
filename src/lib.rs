pub mod config;
pub mod erosion;
pub mod error;
pub mod flow;
pub mod grid;
pub mod heightmap;
pub mod pipeline;
pub mod rivers;
pub mod settlement;
pub mod sinks;

pub use config::{GenerationParams, TuningConstants};
pub use error::TerrainError;
pub use heightmap::{Heightmap, generate_heightmap};
pub use pipeline::{World, WorldSummary, generate_world, generate_world_with_rng};
