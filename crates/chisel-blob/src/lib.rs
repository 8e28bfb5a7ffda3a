//! Packed sub-block voxel storage: the `S×S×S` blob, its byte codecs,
//! statistics and rigid transforms.
#![forbid(unsafe_code)]

pub mod bits;
pub mod blob;
pub mod codec;
pub mod error;
pub mod reference;
pub mod stats;
pub mod transform;

pub use blob::{DEFAULT_SIDE, MAX_SIDE, VoxelBlob};
pub use codec::BlobVersion;
pub use error::BlobError;
pub use reference::BlobRef;
pub use stats::{BlobStats, SideSampling};
