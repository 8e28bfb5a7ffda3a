use chisel_blob::BlobError;
use chisel_blocks::StateId;
use chisel_geom::{BitPos, BlockPos};
use thiserror::Error;

use crate::change::ActorId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("bit at {pos:?} is already occupied by state {state}")]
    SpaceOccupied { pos: BitPos, state: StateId },
    #[error("bit at {pos:?} lies outside the mutator's area")]
    OutsideArea { pos: BitPos },
    #[error("{actor} may not edit the block at {block:?}")]
    Unauthorized { actor: ActorId, block: BlockPos },
    #[error("need {needed} bits of state {state}, only {available} available")]
    MissingBits {
        state: StateId,
        needed: usize,
        available: usize,
    },
    #[error(transparent)]
    Blob(#[from] BlobError),
}
