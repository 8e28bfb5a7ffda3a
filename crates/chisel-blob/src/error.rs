use chisel_blocks::StateId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("bit ({x}, {y}, {z}) is outside a blob of side {side}")]
    OutOfRange {
        x: usize,
        y: usize,
        z: usize,
        side: usize,
    },
    #[error("malformed blob data: {reason}")]
    MalformedBlobData { reason: String },
    #[error("state {state} does not fit the 4-bit legacy format")]
    LegacyStateOverflow { state: StateId },
    #[error("unsupported blob side {0} (expected 1..=64)")]
    UnsupportedSide(usize),
}

impl BlobError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        BlobError::MalformedBlobData {
            reason: reason.into(),
        }
    }
}
