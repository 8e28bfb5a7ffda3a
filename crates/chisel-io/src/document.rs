use std::fs;
use std::path::Path;

use chisel_area::BlobWorld;
use chisel_geom::BlockPos;
use serde::{Deserialize, Serialize};

use crate::error::IoError;
use crate::record::ChiseledRecord;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub pos: [i64; 3],
    #[serde(flatten)]
    pub record: ChiseledRecord,
}

impl BlockEntry {
    pub fn block(&self) -> BlockPos {
        BlockPos::new(self.pos[0], self.pos[1], self.pos[2])
    }
}

/// TOML file holding every chiseled block of a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldDocument {
    pub side: usize,
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
}

impl WorldDocument {
    pub fn empty(side: usize) -> Self {
        Self {
            side,
            blocks: Vec::new(),
        }
    }

    /// Snapshot of the published state of `world`, sorted by position.
    pub fn capture(world: &BlobWorld) -> Self {
        let mut blocks: Vec<BlockEntry> = world
            .containers()
            .map(|(pos, c)| BlockEntry {
                pos: [pos.x, pos.y, pos.z],
                record: ChiseledRecord::from_container(c),
            })
            .collect();
        blocks.sort_by_key(|e| e.pos);
        Self {
            side: world.side(),
            blocks,
        }
    }

    /// Loads every entry into `world`; returns how many blocks were placed.
    pub fn restore(&self, world: &mut BlobWorld) -> Result<usize, IoError> {
        if self.side != world.side() {
            return Err(IoError::SideMismatch {
                expected: world.side(),
                found: self.side,
            });
        }
        let settings = *world.settings();
        let mut placed = 0;
        for entry in &self.blocks {
            let blob = entry.record.to_blob_ref(
                settings.side,
                settings.version,
                settings.fallback_state,
            )?;
            world.insert_container(entry.block(), blob);
            placed += 1;
        }
        log::info!(target: "io", "restored {placed} chiseled blocks");
        Ok(placed)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, IoError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, IoError> {
        Ok(toml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
