use std::fmt;
use std::sync::{Arc, OnceLock};

use chisel_blocks::{AIR, StateId};
use chisel_geom::Axis;

use crate::blob::VoxelBlob;
use crate::codec::BlobVersion;
use crate::error::BlobError;

/// Immutable, cheaply cloned handle to serialized blob bytes with a
/// decode-once cache. Clones share both.
#[derive(Clone)]
pub struct BlobRef {
    inner: Arc<Inner>,
}

struct Inner {
    side: usize,
    bytes: Arc<[u8]>,
    fallback: StateId,
    decoded: OnceLock<Arc<VoxelBlob>>,
}

impl BlobRef {
    /// Wraps bytes without decoding them. Unreadable bytes decode to a blob
    /// filled with `fallback`.
    pub fn from_bytes(side: usize, bytes: impl Into<Arc<[u8]>>, fallback: StateId) -> Self {
        Self {
            inner: Arc::new(Inner {
                side,
                bytes: bytes.into(),
                fallback,
                decoded: OnceLock::new(),
            }),
        }
    }

    /// Encodes `blob` and seeds the cache with it.
    pub fn from_blob(blob: VoxelBlob, version: BlobVersion) -> Result<Self, BlobError> {
        Self::encode(blob, version).map_err(|(e, _)| e)
    }

    /// Like [`BlobRef::from_blob`], but hands the blob back when encoding
    /// fails.
    pub fn encode(blob: VoxelBlob, version: BlobVersion) -> Result<Self, (BlobError, VoxelBlob)> {
        let bytes = match blob.to_bytes(version) {
            Ok(b) => b,
            Err(e) => return Err((e, blob)),
        };
        let decoded = OnceLock::new();
        let side = blob.side();
        let _ = decoded.set(Arc::new(blob));
        Ok(Self {
            inner: Arc::new(Inner {
                side,
                bytes: bytes.into(),
                fallback: AIR,
                decoded,
            }),
        })
    }

    /// All-air reference.
    pub fn empty(side: usize) -> Result<Self, BlobError> {
        Self::from_blob(VoxelBlob::new(side)?, BlobVersion::Paletted)
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.inner.side
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Decoded blob, decoding on first access.
    pub fn blob(&self) -> Arc<VoxelBlob> {
        self.inner
            .decoded
            .get_or_init(|| Arc::new(self.decode_or_fallback()))
            .clone()
    }

    fn decode_or_fallback(&self) -> VoxelBlob {
        let side = self.inner.side;
        match VoxelBlob::from_bytes(side, &self.inner.bytes) {
            Ok(b) => b,
            Err(e) => {
                log::warn!(
                    target: "blob",
                    "failed to decode {} blob bytes ({e}); substituting state {}",
                    self.inner.bytes.len(),
                    self.inner.fallback
                );
                let side = if side == 0 || side > crate::MAX_SIDE {
                    crate::DEFAULT_SIDE
                } else {
                    side
                };
                let n = side * side * side;
                VoxelBlob::from_cells(side, vec![self.inner.fallback; n])
            }
        }
    }

    /// Re-encodes the decoded blob in `version`.
    pub fn to_version(&self, version: BlobVersion) -> Result<Vec<u8>, BlobError> {
        self.blob().to_bytes(version)
    }

    pub fn rotate90(&self, axis: Axis, times: u32) -> Result<BlobRef, BlobError> {
        BlobRef::from_blob(self.blob().rotate90(axis, times), self.version())
    }

    pub fn mirror(&self, axis: Axis) -> Result<BlobRef, BlobError> {
        BlobRef::from_blob(self.blob().mirror(axis), self.version())
    }

    /// Layout the bytes were written in; paletted when unrecognized.
    pub fn version(&self) -> BlobVersion {
        self.inner
            .bytes
            .first()
            .and_then(|&t| BlobVersion::from_tag(t))
            .unwrap_or_default()
    }

    /// Whether two handles share the same allocation.
    pub fn ptr_eq(&self, other: &BlobRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobRef")
            .field("side", &self.inner.side)
            .field("bytes", &self.inner.bytes.len())
            .field("decoded", &self.inner.decoded.get().is_some())
            .finish()
    }
}

impl PartialEq for BlobRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.blob() == other.blob()
    }
}
