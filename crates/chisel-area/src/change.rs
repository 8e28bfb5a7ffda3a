use std::fmt;

use chisel_blocks::StateId;
use chisel_geom::{BitPos, BlockPos};

/// Who performed an edit. `SYSTEM` is used when no player is involved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl ActorId {
    pub const SYSTEM: ActorId = ActorId(0);
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == ActorId::SYSTEM {
            f.write_str("system")
        } else {
            write!(f, "actor#{}", self.0)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitChange {
    pub pos: BitPos,
    pub before: StateId,
    pub after: StateId,
}

/// Every bit changed by one batch, in first-touch order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub actor: ActorId,
    pub entries: Vec<BitChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Containers touched, first-touch order, no repeats.
    pub fn blocks(&self, side: usize) -> Vec<BlockPos> {
        let mut out: Vec<BlockPos> = Vec::new();
        for e in &self.entries {
            let b = e.pos.block(side);
            if !out.contains(&b) {
                out.push(b);
            }
        }
        out
    }

    /// The same edit played backwards.
    pub fn inverted(&self) -> ChangeSet {
        ChangeSet {
            actor: self.actor,
            entries: self
                .entries
                .iter()
                .map(|e| BitChange {
                    pos: e.pos,
                    before: e.after,
                    after: e.before,
                })
                .collect(),
        }
    }
}

/// Receives the aggregated change of each committed batch.
pub trait ChangeSink {
    fn record(&mut self, change: ChangeSet);
}

/// Discards changes.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn record(&mut self, _change: ChangeSet) {}
}

impl ChangeSink for Vec<ChangeSet> {
    fn record(&mut self, change: ChangeSet) {
        self.push(change);
    }
}
