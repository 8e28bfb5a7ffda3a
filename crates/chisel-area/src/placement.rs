//! Placing a stored pattern into the world.

use chisel_blob::BlobRef;
use chisel_blocks::{AIR, StateId};
use chisel_geom::{BitPos, Vec3};

use crate::change::{ActorId, ChangeSink};
use crate::chisel::BitCounts;
use crate::inventory::BitInventory;
use crate::mutator::WorldAreaMutator;
use crate::world::BlobWorld;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlacementMode {
    /// Only into empty space.
    Place,
    /// Replace differing bits, keep identical ones.
    Merge,
    /// Replace every bit under the pattern.
    Impose,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlacementFailure {
    NotFitting,
    MissingBitsOrSpace,
}

impl PlacementFailure {
    pub fn color(self) -> Vec3 {
        match self {
            PlacementFailure::NotFitting => Vec3::rgb(183, 65, 14),
            PlacementFailure::MissingBitsOrSpace => Vec3::rgb(255, 219, 88),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PlacementResult {
    Success,
    Failure {
        color: Vec3,
        reason: PlacementFailure,
    },
}

impl PlacementResult {
    pub fn success_color() -> Vec3 {
        Vec3::rgb(48, 120, 201)
    }

    fn failure(reason: PlacementFailure) -> Self {
        PlacementResult::Failure {
            color: reason.color(),
            reason,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PlacementResult::Success)
    }

    /// Highlight color for the placement preview.
    pub fn color(&self) -> Vec3 {
        match self {
            PlacementResult::Success => Self::success_color(),
            PlacementResult::Failure { color, .. } => *color,
        }
    }
}

/// Writes the non-air bits of `pattern` with its origin at `offset`.
///
/// With `simulate` the world is left untouched and only the verdict is
/// computed. `None` inventory means creative mode.
#[allow(clippy::too_many_arguments)]
pub fn place_pattern(
    world: &mut BlobWorld,
    sink: &mut dyn ChangeSink,
    actor: ActorId,
    pattern: &BlobRef,
    offset: BitPos,
    mode: PlacementMode,
    simulate: bool,
    inventory: Option<&mut dyn BitInventory>,
) -> PlacementResult {
    let blob = pattern.blob();
    let Some(bounds) = blob.bounds() else {
        return PlacementResult::Success;
    };
    let start = offset + bounds.min;
    let end = offset + bounds.max;
    let mut mutator = WorldAreaMutator::covering(world, start, end).with_actor(actor);

    let mut needed = BitCounts::default();
    let mut returned = BitCounts::default();
    let mut writes: Vec<(BitPos, StateId)> = Vec::new();

    for (x, y, z, state) in blob.iter() {
        if state == AIR {
            continue;
        }
        let pos = offset.offset(x as i64, y as i64, z as i64);
        if !mutator.can_edit(pos) {
            return PlacementResult::failure(PlacementFailure::NotFitting);
        }
        let current = mutator.get_in_area(pos).map_or(AIR, |e| e.state);
        match mode {
            PlacementMode::Place if current != AIR => {
                return PlacementResult::failure(PlacementFailure::NotFitting);
            }
            PlacementMode::Merge if current == state => continue,
            _ => {}
        }
        if current != AIR {
            returned.add(current, 1);
        }
        needed.add(state, 1);
        writes.push((pos, state));
    }

    // a bit replaced by its own state costs nothing
    let (take, give) = net_counts(&needed, &returned);
    let mut inventory = inventory;
    if let Some(inv) = inventory.as_deref_mut() {
        let short_bits = take.iter().any(|(s, n)| inv.available(s) < n);
        let short_space = give.iter().any(|(s, n)| inv.space_for(s) < n);
        if short_bits || short_space {
            return PlacementResult::failure(PlacementFailure::MissingBitsOrSpace);
        }
    }
    if simulate {
        return PlacementResult::Success;
    }

    if let Some(inv) = inventory.as_deref_mut() {
        for (s, n) in take.iter() {
            inv.extract(s, n);
        }
        for (s, n) in give.iter() {
            inv.insert(s, n);
        }
    }
    let mut batch = mutator.batch(sink);
    for (pos, state) in writes {
        if let Err(e) = batch.override_in_area(state, pos) {
            log::warn!(target: "placement", "pattern write at {:?} failed: {e}", pos);
        }
    }
    PlacementResult::Success
}

/// Splits per-state demand into bits to take from and bits to hand back to
/// the inventory.
fn net_counts(needed: &BitCounts, returned: &BitCounts) -> (BitCounts, BitCounts) {
    let mut take = BitCounts::default();
    let mut give = BitCounts::default();
    for (s, n) in needed.iter() {
        let r = returned.get(s);
        if n > r {
            take.add(s, n - r);
        }
    }
    for (s, r) in returned.iter() {
        let n = needed.get(s);
        if r > n {
            give.add(s, r - n);
        }
    }
    (take, give)
}
