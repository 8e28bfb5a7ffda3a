//! State table: maps bit state ids to the properties the voxel core reads.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use registry::{StateRegistry, StateType};
pub use types::{AIR, StateId, StateProperties, StateTable, VoxelKind};
