use chisel_blocks::{AIR, StateId};
use chisel_geom::{BitBox, BitPos, BlockPos};
use hashbrown::HashMap;

use crate::batch::BatchMutation;
use crate::change::{ActorId, BitChange, ChangeSet, ChangeSink};
use crate::error::MutationError;
use crate::world::BlobWorld;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StateEntryInfo {
    pub pos: BitPos,
    pub state: StateId,
}

/// Writes collected while a batch is open.
#[derive(Default)]
pub(crate) struct Pending {
    blocks: Vec<BlockPos>,
    changes: Vec<BitChange>,
    index: HashMap<BitPos, usize>,
}

impl Pending {
    fn note(&mut self, block: BlockPos, pos: BitPos, before: StateId, after: StateId) {
        if !self.blocks.contains(&block) {
            self.blocks.push(block);
        }
        match self.index.get(&pos) {
            Some(&i) => self.changes[i].after = after,
            None => {
                self.index.insert(pos, self.changes.len());
                self.changes.push(BitChange { pos, before, after });
            }
        }
    }
}

/// Read/write view over an inclusive box of absolute bit positions.
pub struct WorldAreaMutator<'w> {
    world: &'w mut BlobWorld,
    area: BitBox,
    actor: ActorId,
    pub(crate) pending: Option<Pending>,
}

impl<'w> WorldAreaMutator<'w> {
    pub fn covering(world: &'w mut BlobWorld, start: BitPos, end: BitPos) -> Self {
        Self {
            world,
            area: BitBox::new(start, end),
            actor: ActorId::SYSTEM,
            pending: None,
        }
    }

    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = actor;
        self
    }

    #[inline]
    pub fn area(&self) -> BitBox {
        self.area
    }

    #[inline]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn world(&self) -> &BlobWorld {
        self.world
    }

    #[inline]
    pub fn is_inside(&self, pos: BitPos) -> bool {
        self.area.contains(pos)
    }

    pub fn get_in_area(&self, pos: BitPos) -> Option<StateEntryInfo> {
        self.is_inside(pos).then(|| StateEntryInfo {
            pos,
            state: self.world.state_at(pos),
        })
    }

    /// Every position of the area, y-major then z then x.
    pub fn entries(&self) -> impl Iterator<Item = StateEntryInfo> + '_ {
        self.area.iter().map(|pos| StateEntryInfo {
            pos,
            state: self.world.state_at(pos),
        })
    }

    /// Places `state` into an empty cell.
    pub fn set_in_area(&mut self, state: StateId, pos: BitPos) -> Result<(), MutationError> {
        self.write(state, pos, true)
    }

    pub fn clear_in_area(&mut self, pos: BitPos) -> Result<(), MutationError> {
        self.write(AIR, pos, false)
    }

    /// Like [`Self::set_in_area`] without the occupancy check.
    pub fn override_in_area(&mut self, state: StateId, pos: BitPos) -> Result<(), MutationError> {
        self.write(state, pos, false)
    }

    /// Whether the acting player may edit the container holding `pos`.
    pub fn can_edit(&self, pos: BitPos) -> bool {
        self.world.can_edit(self.actor, pos.block(self.world.side()))
    }

    fn write(
        &mut self,
        state: StateId,
        pos: BitPos,
        must_be_empty: bool,
    ) -> Result<(), MutationError> {
        if !self.is_inside(pos) {
            return Err(MutationError::OutsideArea { pos });
        }
        let block = pos.block(self.world.side());
        if !self.world.can_edit(self.actor, block) {
            return Err(MutationError::Unauthorized {
                actor: self.actor,
                block,
            });
        }
        let before = self.world.state_at(pos);
        if must_be_empty && before != AIR {
            return Err(MutationError::SpaceOccupied { pos, state: before });
        }
        if before == state {
            return Ok(());
        }
        self.world.write_cell(pos, state)?;
        match self.pending.as_mut() {
            Some(p) => p.note(block, pos, before, state),
            None => self.world.publish(block)?,
        }
        Ok(())
    }

    /// Opens a batch. Notifications and the change record are deferred
    /// until the returned guard is dropped.
    pub fn batch<'m>(&'m mut self, sink: &'m mut dyn ChangeSink) -> BatchMutation<'m, 'w> {
        BatchMutation::open(self, sink)
    }

    /// Publishes every container touched since the batch opened and hands
    /// the net change to `sink`.
    pub(crate) fn commit(&mut self, sink: &mut dyn ChangeSink) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let mut failed = Vec::new();
        for block in &pending.blocks {
            if let Err(e) = self.world.publish(*block) {
                log::error!(target: "area", "failed to publish {:?}: {e}", block);
                failed.push(*block);
            }
        }
        let side = self.world.side();
        let entries: Vec<BitChange> = pending
            .changes
            .into_iter()
            .filter(|c| c.before != c.after && !failed.contains(&c.pos.block(side)))
            .collect();
        if !entries.is_empty() {
            log::debug!(
                target: "area",
                "batch by {} changed {} bits in {} blocks",
                self.actor,
                entries.len(),
                pending.blocks.len()
            );
            sink.record(ChangeSet {
                actor: self.actor,
                entries,
            });
        }
    }
}
