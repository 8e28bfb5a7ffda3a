//! Chisel tool shapes and the chisel/place operation.

use std::collections::BTreeMap;

use chisel_blocks::{AIR, StateId};
use chisel_geom::{BitBox, BitPos, Vec3};

use crate::change::{ActorId, ChangeSink};
use crate::error::MutationError;
use crate::inventory::BitInventory;
use crate::mutator::WorldAreaMutator;
use crate::world::BlobWorld;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChiselMode {
    Single,
    /// Axis-aligned cube of `size` bits per edge.
    Cube { size: u32 },
    /// Ball of `diameter` bits.
    Sphere { diameter: u32 },
}

impl ChiselMode {
    /// Bounding box of the shape aimed at `target`.
    pub fn area(self, target: BitPos) -> BitBox {
        let extent = match self {
            ChiselMode::Single => 1,
            ChiselMode::Cube { size } => size.max(1) as i64,
            ChiselMode::Sphere { diameter } => diameter.max(1) as i64,
        };
        let lo = target.offset(-(extent - 1) / 2, -(extent - 1) / 2, -(extent - 1) / 2);
        BitBox::new(lo, lo.offset(extent - 1, extent - 1, extent - 1))
    }

    /// Positions of the shape in y, z, x order.
    pub fn positions(self, target: BitPos) -> Vec<BitPos> {
        let area = self.area(target);
        match self {
            ChiselMode::Single | ChiselMode::Cube { .. } => area.iter().collect(),
            ChiselMode::Sphere { diameter } => {
                let r = diameter.max(1) as f32 / 2.0;
                let (sx, sy, sz) = area.size();
                let centre = Vec3::new(
                    area.min.x as f32 + sx as f32 / 2.0,
                    area.min.y as f32 + sy as f32 / 2.0,
                    area.min.z as f32 + sz as f32 / 2.0,
                );
                area.iter()
                    .filter(|p| (p.center() - centre).length() <= r)
                    .collect()
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChiselOperation {
    /// Remove bits, returning them to the inventory.
    Chisel,
    /// Fill empty bits with a state taken from the inventory.
    Place(StateId),
}

/// Bit tally per state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitCounts(BTreeMap<StateId, usize>);

impl BitCounts {
    pub fn add(&mut self, state: StateId, n: usize) {
        if n > 0 {
            *self.0.entry(state).or_insert(0) += n;
        }
    }

    pub fn get(&self, state: StateId) -> usize {
        self.0.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, usize)> + '_ {
        self.0.iter().map(|(&s, &n)| (s, n))
    }
}

/// Applies `op` over the shape of `mode` at `target` as one batch.
///
/// Positions the actor may not edit are skipped. Chiseled bits go into
/// `inventory` as far as it has room; placing needs every bit up front.
/// `None` means creative mode with no accounting.
pub fn chisel(
    world: &mut BlobWorld,
    sink: &mut dyn ChangeSink,
    actor: ActorId,
    mode: ChiselMode,
    op: ChiselOperation,
    target: BitPos,
    mut inventory: Option<&mut dyn BitInventory>,
) -> Result<BitCounts, MutationError> {
    let area = mode.area(target);
    let positions = mode.positions(target);
    let mut mutator = WorldAreaMutator::covering(world, area.min, area.max).with_actor(actor);
    let mut counts = BitCounts::default();

    match op {
        ChiselOperation::Chisel => {
            let hits: Vec<(BitPos, StateId)> = positions
                .into_iter()
                .filter(|&p| mutator.can_edit(p))
                .filter_map(|p| mutator.get_in_area(p))
                .filter(|e| e.state != AIR)
                .map(|e| (e.pos, e.state))
                .collect();
            let mut batch = mutator.batch(sink);
            let mut result = Ok(());
            for (pos, state) in hits {
                if let Err(e) = batch.clear_in_area(pos) {
                    result = Err(e);
                    break;
                }
                counts.add(state, 1);
            }
            drop(batch);
            if let Some(inv) = inventory.as_deref_mut() {
                for (state, n) in counts.iter() {
                    let stored = inv.insert(state, n);
                    if stored < n {
                        log::debug!(
                            target: "chisel",
                            "inventory full, dropped {} bits of {}",
                            n - stored,
                            state
                        );
                    }
                }
            }
            result?;
        }
        ChiselOperation::Place(state) => {
            if state == AIR {
                return Ok(counts);
            }
            let free: Vec<BitPos> = positions
                .into_iter()
                .filter(|&p| mutator.can_edit(p))
                .filter(|&p| mutator.get_in_area(p).is_some_and(|e| e.state == AIR))
                .collect();
            if let Some(inv) = inventory.as_deref_mut() {
                let available = inv.available(state);
                if available < free.len() {
                    return Err(MutationError::MissingBits {
                        state,
                        needed: free.len(),
                        available,
                    });
                }
            }
            let mut batch = mutator.batch(sink);
            let mut result = Ok(());
            for pos in free {
                if let Err(e) = batch.set_in_area(state, pos) {
                    result = Err(e);
                    break;
                }
                counts.add(state, 1);
            }
            drop(batch);
            // only the bits that actually landed leave the inventory
            if let Some(inv) = inventory.as_deref_mut() {
                inv.extract(state, counts.get(state));
            }
            result?;
        }
    }
    Ok(counts)
}
