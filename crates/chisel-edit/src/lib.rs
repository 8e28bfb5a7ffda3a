//! Per-actor undo/redo over batched world edits.
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::fmt;

use chisel_area::{ActorId, BlobWorld, ChangeSet, ChangeSink, NullSink, WorldAreaMutator};
use chisel_blocks::StateId;
use chisel_geom::{BitBox, BitPos};
use hashbrown::HashMap;
use thiserror::Error;

/// Monotonic stamp identifying one recorded change.
pub type ChangeId = u64;

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Undo,
    Redo,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Undo => "undo",
            ChangeKind::Redo => "redo",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Refusal {
    NothingToApply,
    /// A bit no longer holds the state the change expects.
    StateDiverged(BitPos),
    /// A later change touched the bit.
    Superseded(BitPos),
    Unauthorized(BitPos),
    ApplyFailed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("{actor} cannot {kind}: {reason:?}")]
pub struct IllegalChangeAttempt {
    pub actor: ActorId,
    pub kind: ChangeKind,
    pub reason: Refusal,
}

#[derive(Clone, Debug)]
struct Entry {
    id: ChangeId,
    change: ChangeSet,
    /// Revision of each position before this change, parallel to entries.
    prior: Vec<Option<ChangeId>>,
}

/// Records committed batches and replays them backwards or forwards.
pub struct ChangeTracker {
    max_depth: usize,
    undo: HashMap<ActorId, VecDeque<Entry>>,
    redo: HashMap<ActorId, Vec<Entry>>,
    revisions: HashMap<BitPos, ChangeId>,
    counter: ChangeId,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ChangeTracker {
    /// `max_depth` caps each actor's undo history; 0 disables tracking.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            undo: HashMap::new(),
            redo: HashMap::new(),
            revisions: HashMap::new(),
            counter: 0,
        }
    }

    fn next_id(&mut self) -> ChangeId {
        self.counter = self.counter.wrapping_add(1).max(1);
        self.counter
    }

    /// Stores `change` on its actor's undo stack and clears their redo stack.
    pub fn push(&mut self, change: ChangeSet) -> Option<ChangeId> {
        if change.is_empty() || self.max_depth == 0 {
            return None;
        }
        let id = self.next_id();
        let prior = change
            .entries
            .iter()
            .map(|e| self.revisions.insert(e.pos, id))
            .collect();
        let actor = change.actor;
        let mut gone = self.redo.remove(&actor).unwrap_or_default();
        let stack = self.undo.entry(actor).or_default();
        stack.push_back(Entry { id, change, prior });
        while stack.len() > self.max_depth {
            gone.extend(stack.pop_front());
        }
        self.retire(gone);
        log::debug!(target: "edit", "recorded change {id} for {actor}");
        Some(id)
    }

    /// Forgets the revisions of entries that left every stack, so neither
    /// the revision map nor a surviving entry's prior refers to them.
    fn retire(&mut self, gone: Vec<Entry>) {
        if gone.is_empty() {
            return;
        }
        let ids: Vec<ChangeId> = gone.iter().map(|e| e.id).collect();
        for entry in &gone {
            for e in &entry.change.entries {
                if self.revisions.get(&e.pos) == Some(&entry.id) {
                    self.revisions.remove(&e.pos);
                }
            }
        }
        let live = self
            .undo
            .values_mut()
            .flatten()
            .chain(self.redo.values_mut().flatten());
        for entry in live {
            for prior in &mut entry.prior {
                if prior.is_some_and(|id| ids.contains(&id)) {
                    *prior = None;
                }
            }
        }
    }

    pub fn undo_depth(&self, actor: ActorId) -> usize {
        self.undo.get(&actor).map_or(0, VecDeque::len)
    }

    pub fn redo_depth(&self, actor: ActorId) -> usize {
        self.redo.get(&actor).map_or(0, Vec::len)
    }

    /// Last change that touched `pos`, if any is on record.
    pub fn last_change_at(&self, pos: BitPos) -> Option<ChangeId> {
        self.revisions.get(&pos).copied()
    }

    pub fn clear(&mut self, actor: ActorId) {
        let mut gone: Vec<Entry> = self.undo.remove(&actor).unwrap_or_default().into();
        gone.extend(self.redo.remove(&actor).unwrap_or_default());
        self.retire(gone);
    }

    pub fn can_undo(&self, actor: ActorId, world: &BlobWorld) -> bool {
        self.check(actor, ChangeKind::Undo, world).is_ok()
    }

    pub fn can_redo(&self, actor: ActorId, world: &BlobWorld) -> bool {
        self.check(actor, ChangeKind::Redo, world).is_ok()
    }

    fn top(&self, actor: ActorId, kind: ChangeKind) -> Option<&Entry> {
        match kind {
            ChangeKind::Undo => self.undo.get(&actor).and_then(|s| s.back()),
            ChangeKind::Redo => self.redo.get(&actor).and_then(|s| s.last()),
        }
    }

    fn check(
        &self,
        actor: ActorId,
        kind: ChangeKind,
        world: &BlobWorld,
    ) -> Result<(), IllegalChangeAttempt> {
        let refuse = |reason| IllegalChangeAttempt { actor, kind, reason };
        let entry = self.top(actor, kind).ok_or(refuse(Refusal::NothingToApply))?;
        let side = world.side();
        for (e, prior) in entry.change.entries.iter().zip(&entry.prior) {
            let (expect_state, expect_rev) = match kind {
                ChangeKind::Undo => (e.after, Some(entry.id)),
                ChangeKind::Redo => (e.before, *prior),
            };
            if world.state_at(e.pos) != expect_state {
                return Err(refuse(Refusal::StateDiverged(e.pos)));
            }
            if self.revisions.get(&e.pos).copied() != expect_rev {
                return Err(refuse(Refusal::Superseded(e.pos)));
            }
            if !world.can_edit(actor, e.pos.block(side)) {
                return Err(refuse(Refusal::Unauthorized(e.pos)));
            }
        }
        Ok(())
    }

    /// Reverts the actor's most recent change.
    pub fn undo(
        &mut self,
        actor: ActorId,
        world: &mut BlobWorld,
    ) -> Result<ChangeId, IllegalChangeAttempt> {
        self.check(actor, ChangeKind::Undo, world)?;
        let Some(entry) = self.undo.get_mut(&actor).and_then(VecDeque::pop_back) else {
            return Err(IllegalChangeAttempt {
                actor,
                kind: ChangeKind::Undo,
                reason: Refusal::NothingToApply,
            });
        };
        let targets: Vec<(BitPos, StateId)> =
            entry.change.entries.iter().map(|e| (e.pos, e.before)).collect();
        if apply(world, actor, &targets).is_err() {
            self.undo.entry(actor).or_default().push_back(entry);
            return Err(IllegalChangeAttempt {
                actor,
                kind: ChangeKind::Undo,
                reason: Refusal::ApplyFailed,
            });
        }
        for (e, prior) in entry.change.entries.iter().zip(&entry.prior) {
            match prior {
                Some(rev) => self.revisions.insert(e.pos, *rev),
                None => self.revisions.remove(&e.pos),
            };
        }
        let id = entry.id;
        self.redo.entry(actor).or_default().push(entry);
        log::debug!(target: "edit", "{actor} undid change {id}");
        Ok(id)
    }

    /// Re-applies the actor's most recently undone change.
    pub fn redo(
        &mut self,
        actor: ActorId,
        world: &mut BlobWorld,
    ) -> Result<ChangeId, IllegalChangeAttempt> {
        self.check(actor, ChangeKind::Redo, world)?;
        let Some(entry) = self.redo.get_mut(&actor).and_then(Vec::pop) else {
            return Err(IllegalChangeAttempt {
                actor,
                kind: ChangeKind::Redo,
                reason: Refusal::NothingToApply,
            });
        };
        let targets: Vec<(BitPos, StateId)> =
            entry.change.entries.iter().map(|e| (e.pos, e.after)).collect();
        if apply(world, actor, &targets).is_err() {
            self.redo.entry(actor).or_default().push(entry);
            return Err(IllegalChangeAttempt {
                actor,
                kind: ChangeKind::Redo,
                reason: Refusal::ApplyFailed,
            });
        }
        for e in &entry.change.entries {
            self.revisions.insert(e.pos, entry.id);
        }
        let id = entry.id;
        self.undo.entry(actor).or_default().push_back(entry);
        log::debug!(target: "edit", "{actor} redid change {id}");
        Ok(id)
    }
}

impl ChangeSink for ChangeTracker {
    fn record(&mut self, change: ChangeSet) {
        self.push(change);
    }
}

/// Writes `targets` in one batch so each container is notified once.
fn apply(
    world: &mut BlobWorld,
    actor: ActorId,
    targets: &[(BitPos, StateId)],
) -> Result<(), chisel_area::MutationError> {
    let Some(&(first, _)) = targets.first() else {
        return Ok(());
    };
    let area = targets
        .iter()
        .fold(BitBox::point(first), |b, &(p, _)| b.including(p));
    let mut mutator = WorldAreaMutator::covering(world, area.min, area.max).with_actor(actor);
    let mut sink = NullSink;
    let mut batch = mutator.batch(&mut sink);
    for &(pos, state) in targets {
        batch.override_in_area(state, pos)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chisel_area::{BitChange, WorldSettings};
    use chisel_blocks::StateRegistry;
    use std::sync::Arc;

    fn world() -> BlobWorld {
        let settings = WorldSettings {
            side: 4,
            ..WorldSettings::default()
        };
        BlobWorld::new(Arc::new(StateRegistry::new()), settings).unwrap()
    }

    fn paint(
        world: &mut BlobWorld,
        tracker: &mut ChangeTracker,
        actor: ActorId,
        pos: BitPos,
        state: StateId,
    ) {
        let mut m = WorldAreaMutator::covering(world, pos, pos).with_actor(actor);
        let mut batch = m.batch(tracker);
        batch.override_in_area(state, pos).unwrap();
    }

    #[test]
    fn empty_changes_are_ignored() {
        let mut t = ChangeTracker::default();
        assert_eq!(t.push(ChangeSet::default()), None);
        let mut off = ChangeTracker::new(0);
        let set = ChangeSet {
            actor: ActorId(1),
            entries: vec![BitChange {
                pos: BitPos::ORIGIN,
                before: 0,
                after: 1,
            }],
        };
        assert_eq!(off.push(set), None);
    }

    #[test]
    fn undo_then_redo_restores_states() {
        let mut w = world();
        let mut t = ChangeTracker::default();
        let a = ActorId(1);
        let p = BitPos::new(1, 2, 3);
        paint(&mut w, &mut t, a, p, 5);
        paint(&mut w, &mut t, a, p, 6);
        assert_eq!(t.undo_depth(a), 2);

        t.undo(a, &mut w).unwrap();
        assert_eq!(w.state_at(p), 5);
        t.undo(a, &mut w).unwrap();
        assert_eq!(w.state_at(p), 0);
        assert!(w.is_empty());
        assert_eq!(t.last_change_at(p), None);

        t.redo(a, &mut w).unwrap();
        t.redo(a, &mut w).unwrap();
        assert_eq!(w.state_at(p), 6);
        assert_eq!(t.redo_depth(a), 0);
        let err = t.redo(a, &mut w).unwrap_err();
        assert_eq!(err.reason, Refusal::NothingToApply);
    }

    #[test]
    fn later_change_by_someone_else_blocks_undo() {
        let mut w = world();
        let mut t = ChangeTracker::default();
        let (a, b) = (ActorId(1), ActorId(2));
        let p = BitPos::ORIGIN;
        paint(&mut w, &mut t, a, p, 3);
        paint(&mut w, &mut t, b, p, 3 + 1);
        assert!(!t.can_undo(a, &w));
        let err = t.undo(a, &mut w).unwrap_err();
        assert_eq!(err.kind, ChangeKind::Undo);
        assert!(matches!(err.reason, Refusal::StateDiverged(_)));
        // the stacks are untouched by a refused undo
        assert_eq!(t.undo_depth(a), 1);
        assert!(t.can_undo(b, &w));
    }

    #[test]
    fn recording_clears_redo() {
        let mut w = world();
        let mut t = ChangeTracker::default();
        let a = ActorId(9);
        paint(&mut w, &mut t, a, BitPos::ORIGIN, 1);
        t.undo(a, &mut w).unwrap();
        assert!(t.can_redo(a, &w));
        paint(&mut w, &mut t, a, BitPos::new(1, 0, 0), 2);
        assert_eq!(t.redo_depth(a), 0);
    }

    #[test]
    fn depth_is_capped() {
        let mut w = world();
        let mut t = ChangeTracker::new(2);
        let a = ActorId(1);
        for x in 0..5 {
            paint(&mut w, &mut t, a, BitPos::new(x, 0, 0), 1);
        }
        assert_eq!(t.undo_depth(a), 2);
        // evicted changes leave no revisions behind
        assert_eq!(t.last_change_at(BitPos::new(0, 0, 0)), None);
        assert_eq!(t.last_change_at(BitPos::new(2, 0, 0)), None);
        assert!(t.last_change_at(BitPos::new(4, 0, 0)).is_some());
        assert_eq!(t.revisions.len(), 2);
    }

    #[test]
    fn eviction_keeps_remaining_history_usable() {
        let mut w = world();
        let mut t = ChangeTracker::new(1);
        let a = ActorId(1);
        let p = BitPos::new(1, 1, 1);
        paint(&mut w, &mut t, a, p, 3);
        paint(&mut w, &mut t, a, p, 4);
        t.undo(a, &mut w).unwrap();
        assert_eq!(w.state_at(p), 3);
        assert_eq!(t.last_change_at(p), None);
        t.redo(a, &mut w).unwrap();
        assert_eq!(w.state_at(p), 4);
    }

    #[test]
    fn clear_drops_revisions() {
        let mut w = world();
        let mut t = ChangeTracker::default();
        let (a, b) = (ActorId(1), ActorId(2));
        paint(&mut w, &mut t, a, BitPos::ORIGIN, 1);
        paint(&mut w, &mut t, a, BitPos::new(1, 0, 0), 1);
        t.undo(a, &mut w).unwrap();
        paint(&mut w, &mut t, b, BitPos::new(2, 0, 0), 1);
        t.clear(a);
        assert_eq!(t.undo_depth(a) + t.redo_depth(a), 0);
        assert_eq!(t.last_change_at(BitPos::ORIGIN), None);
        assert!(t.last_change_at(BitPos::new(2, 0, 0)).is_some());
        assert_eq!(t.revisions.len(), 1);
    }
}
