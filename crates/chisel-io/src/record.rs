use chisel_area::ChiseledBlock;
use chisel_blob::{BlobError, BlobRef, BlobVersion, VoxelBlob};
use chisel_blocks::{AIR, StateId};
use serde::{Deserialize, Serialize};

/// Stored form of one chiseled block. Older saves carry untagged nibble data
/// under `v` instead of versioned bytes under `X`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChiseledRecord {
    #[serde(rename = "b", default)]
    pub primary_state: StateId,
    #[serde(rename = "s", default)]
    pub side_flags: u8,
    #[serde(rename = "l", default)]
    pub opacity: f32,
    #[serde(rename = "lv", default)]
    pub light: u8,
    #[serde(rename = "X", default, skip_serializing_if = "Option::is_none", with = "b64")]
    pub versioned: Option<Vec<u8>>,
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none", with = "b64")]
    pub legacy: Option<Vec<u8>>,
}

impl ChiseledRecord {
    pub fn from_container(c: &ChiseledBlock) -> Self {
        Self {
            primary_state: c.primary_state,
            side_flags: c.side_flags,
            opacity: c.opacity,
            light: c.light_level,
            versioned: Some(c.blob().bytes().to_vec()),
            legacy: None,
        }
    }

    /// Blob reference for this record.
    ///
    /// Legacy nibble data is migrated to `version`. A record without voxel
    /// data is a full block of its primary state, or of `fallback` when that
    /// is air.
    pub fn to_blob_ref(
        &self,
        side: usize,
        version: BlobVersion,
        fallback: StateId,
    ) -> Result<BlobRef, BlobError> {
        if let Some(bytes) = &self.versioned {
            return Ok(BlobRef::from_bytes(side, bytes.clone(), fallback));
        }
        if let Some(bytes) = &self.legacy {
            return match VoxelBlob::from_legacy_bytes(side, bytes) {
                Ok(blob) => {
                    log::info!(
                        target: "io",
                        "migrating legacy record ({} bytes) to {:?}",
                        bytes.len(),
                        version
                    );
                    BlobRef::from_blob(blob, version)
                }
                Err(e) => {
                    log::warn!(
                        target: "io",
                        "unreadable legacy record ({e}); using state {fallback}"
                    );
                    BlobRef::from_blob(VoxelBlob::filled(side, fallback)?, version)
                }
            };
        }
        let state = if self.primary_state == AIR {
            fallback
        } else {
            self.primary_state
        };
        BlobRef::from_blob(VoxelBlob::filled(side, state)?, version)
    }
}

mod b64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(text) => STANDARD
                .decode(text.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
