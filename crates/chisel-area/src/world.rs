use std::sync::Arc;

use chisel_blob::{BlobError, BlobRef, BlobVersion, DEFAULT_SIDE, SideSampling, VoxelBlob};
use chisel_blocks::{AIR, StateId, StateRegistry};
use chisel_geom::{BitPos, BlockPos};
use hashbrown::HashMap;

use crate::change::ActorId;
use crate::container::ChiseledBlock;
use crate::hooks::{AllowAll, Authorizer, ContainerListener, NullListener};

/// Knobs shared by every container of a world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldSettings {
    pub side: usize,
    /// Format used when publishing edited blobs.
    pub version: BlobVersion,
    /// Substituted for blob bytes that fail to decode.
    pub fallback_state: StateId,
    /// Side-flag window; `None` scales the default window to `side`.
    pub sampling: Option<SideSampling>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            side: DEFAULT_SIDE,
            version: BlobVersion::default(),
            fallback_state: AIR,
            sampling: None,
        }
    }
}

impl WorldSettings {
    pub fn sampling(&self) -> SideSampling {
        self.sampling.unwrap_or_else(|| SideSampling::for_side(self.side))
    }
}

/// Sparse set of chiseled blocks. Absent blocks read as air.
pub struct BlobWorld {
    settings: WorldSettings,
    registry: Arc<StateRegistry>,
    listener: Box<dyn ContainerListener>,
    authorizer: Box<dyn Authorizer>,
    containers: HashMap<BlockPos, ChiseledBlock>,
}

impl BlobWorld {
    pub fn new(registry: Arc<StateRegistry>, settings: WorldSettings) -> Result<Self, BlobError> {
        // validates the side length up front
        VoxelBlob::new(settings.side)?;
        Ok(Self {
            settings,
            registry,
            listener: Box::new(NullListener),
            authorizer: Box::new(AllowAll),
            containers: HashMap::new(),
        })
    }

    pub fn with_listener(mut self, listener: impl ContainerListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Box::new(authorizer);
        self
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.settings.side
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    pub fn container(&self, block: BlockPos) -> Option<&ChiseledBlock> {
        self.containers.get(&block)
    }

    pub fn containers(&self) -> impl Iterator<Item = (&BlockPos, &ChiseledBlock)> {
        self.containers.iter()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Installs previously stored bytes as the published blob of `block`.
    /// Bytes that fail to decode become a block of the fallback state.
    pub fn load_container(&mut self, block: BlockPos, bytes: impl Into<Arc<[u8]>>) {
        let blob = BlobRef::from_bytes(self.side(), bytes, self.settings.fallback_state);
        self.insert_container(block, blob);
    }

    pub fn insert_container(&mut self, block: BlockPos, blob: BlobRef) {
        if blob.blob().is_empty() {
            self.containers.remove(&block);
            return;
        }
        let c = ChiseledBlock::new(blob, self.registry.as_ref(), self.settings.sampling());
        self.containers.insert(block, c);
    }

    /// State at an absolute bit position, uncommitted writes included.
    pub fn state_at(&self, pos: BitPos) -> StateId {
        let side = self.side();
        let (x, y, z) = pos.local(side);
        self.containers
            .get(&pos.block(side))
            .and_then(|c| c.state(x, y, z).ok())
            .unwrap_or(AIR)
    }

    pub fn can_edit(&self, actor: ActorId, block: BlockPos) -> bool {
        self.authorizer.can_edit_position(actor, block)
    }

    /// Writes into the container's working copy, creating the container on
    /// the first non-air write.
    pub(crate) fn write_cell(&mut self, pos: BitPos, state: StateId) -> Result<(), BlobError> {
        let side = self.side();
        let block = pos.block(side);
        let (x, y, z) = pos.local(side);
        let container = match self.containers.entry(block) {
            hashbrown::hash_map::Entry::Occupied(e) => e.into_mut(),
            hashbrown::hash_map::Entry::Vacant(e) => {
                if state == AIR {
                    return Ok(());
                }
                e.insert(ChiseledBlock::empty(side)?)
            }
        };
        container.write(x, y, z, state)
    }

    /// Commits pending writes of `block` and notifies the listener.
    pub(crate) fn publish(&mut self, block: BlockPos) -> Result<(), BlobError> {
        let Some(container) = self.containers.get_mut(&block) else {
            self.listener.on_container_changed(block);
            return Ok(());
        };
        let keep = container.publish(
            self.settings.version,
            self.registry.as_ref(),
            self.settings.sampling(),
        )?;
        if keep {
            log::debug!(
                target: "area",
                "published {:?} primary={} light={}",
                block,
                container.primary_state,
                container.light_level
            );
        } else {
            self.containers.remove(&block);
            log::debug!(target: "area", "removed empty container {:?}", block);
        }
        self.listener.on_container_changed(block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_blocks_read_as_air() {
        let w = BlobWorld::new(Arc::new(StateRegistry::new()), WorldSettings::default()).unwrap();
        assert_eq!(w.state_at(BitPos::new(-3, 100, 7)), AIR);
        assert!(w.is_empty());
    }

    #[test]
    fn rejects_bad_side() {
        let settings = WorldSettings {
            side: 0,
            ..WorldSettings::default()
        };
        assert!(BlobWorld::new(Arc::new(StateRegistry::new()), settings).is_err());
    }

    #[test]
    fn corrupt_bytes_load_as_fallback() {
        let settings = WorldSettings {
            side: 4,
            fallback_state: 3,
            ..WorldSettings::default()
        };
        let mut w = BlobWorld::new(Arc::new(StateRegistry::new()), settings).unwrap();
        w.load_container(BlockPos::new(1, 0, 0), vec![0x7f, 1, 2]);
        assert_eq!(w.state_at(BitPos::new(4, 0, 0)), 3);
        assert_eq!(w.container(BlockPos::new(1, 0, 0)).unwrap().primary_state, 3);
    }
}
