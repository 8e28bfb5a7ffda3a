//! Bit storage: a single-state reservoir of up to one block of bits with
//! item and fluid facets.

use std::sync::Arc;

use chisel_blocks::{AIR, StateId, StateRegistry, StateTable, VoxelKind};

use crate::inventory::BitInventory;

/// Millibuckets in one full block of fluid bits.
pub const BUCKET_VOLUME: u32 = 1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Capability {
    Items,
    Fluids,
}

impl Capability {
    const fn bit(self) -> u8 {
        match self {
            Capability::Items => 1,
            Capability::Fluids => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const NONE: CapabilitySet = CapabilitySet(0);
    pub const ALL: CapabilitySet = CapabilitySet(3);

    pub fn with(self, c: Capability) -> Self {
        CapabilitySet(self.0 | c.bit())
    }

    pub fn contains(self, c: Capability) -> bool {
        self.0 & c.bit() != 0
    }
}

/// Item-style access: whole bits.
pub trait ItemContainer {
    /// Returns the bits that did not fit.
    fn insert_bits(&mut self, state: StateId, count: usize, simulate: bool) -> usize;
    fn extract_bits(&mut self, count: usize, simulate: bool) -> Option<(StateId, usize)>;
}

/// Fluid-style access in millibuckets.
pub trait FluidContainer {
    fn tank_capacity(&self) -> u32;
    fn fluid_amount(&self) -> u32;
    /// Returns the amount accepted.
    fn fill(&mut self, state: StateId, amount: u32, simulate: bool) -> u32;
    fn drain(&mut self, max_amount: u32, simulate: bool) -> Option<(StateId, u32)>;
}

pub struct BitStorage {
    registry: Arc<StateRegistry>,
    capabilities: CapabilitySet,
    capacity: usize,
    state: Option<StateId>,
    bits: usize,
}

impl BitStorage {
    /// Holds up to `side^3` bits.
    pub fn new(registry: Arc<StateRegistry>, side: usize, capabilities: CapabilitySet) -> Self {
        Self {
            registry,
            capabilities,
            capacity: side * side * side,
            state: None,
            bits: 0,
        }
    }

    pub fn state(&self) -> Option<StateId> {
        self.state
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn is_fluid(&self) -> bool {
        self.state
            .is_some_and(|s| self.registry.kind(s) == VoxelKind::Fluid)
    }

    /// Light emitted by the stored state scaled by how full the storage is.
    pub fn light_level(&self) -> u8 {
        let Some(state) = self.state else {
            return 0;
        };
        let light = self.registry.resolve(state).light_value as usize;
        (light * self.bits / self.capacity.max(1)) as u8
    }

    pub fn items(&mut self) -> Option<&mut dyn ItemContainer> {
        if self.capabilities.contains(Capability::Items) {
            Some(self)
        } else {
            None
        }
    }

    pub fn fluids(&mut self) -> Option<&mut dyn FluidContainer> {
        if self.capabilities.contains(Capability::Fluids) {
            Some(self)
        } else {
            None
        }
    }

    fn accepts(&self, state: StateId) -> bool {
        state != AIR && self.state.is_none_or(|s| s == state)
    }

    fn store(&mut self, state: StateId, count: usize, simulate: bool) -> usize {
        if !self.accepts(state) {
            return 0;
        }
        let n = count.min(self.capacity - self.bits);
        if !simulate && n > 0 {
            self.state = Some(state);
            self.bits += n;
        }
        n
    }

    fn take(&mut self, count: usize, simulate: bool) -> Option<(StateId, usize)> {
        let state = self.state?;
        let n = count.min(self.bits);
        if n == 0 {
            return None;
        }
        if !simulate {
            self.bits -= n;
            if self.bits == 0 {
                self.state = None;
            }
        }
        Some((state, n))
    }

    fn bits_to_mb(&self, bits: usize) -> u32 {
        (bits as u64 * BUCKET_VOLUME as u64 / self.capacity.max(1) as u64) as u32
    }

    fn mb_to_bits(&self, mb: u32) -> usize {
        (mb as u64 * self.capacity as u64 / BUCKET_VOLUME as u64) as usize
    }
}

impl ItemContainer for BitStorage {
    fn insert_bits(&mut self, state: StateId, count: usize, simulate: bool) -> usize {
        if self.registry.kind(state) == VoxelKind::Fluid {
            return count;
        }
        count - self.store(state, count, simulate)
    }

    fn extract_bits(&mut self, count: usize, simulate: bool) -> Option<(StateId, usize)> {
        if self.is_fluid() {
            return None;
        }
        self.take(count, simulate)
    }
}

impl FluidContainer for BitStorage {
    fn tank_capacity(&self) -> u32 {
        BUCKET_VOLUME
    }

    fn fluid_amount(&self) -> u32 {
        if self.is_fluid() {
            self.bits_to_mb(self.bits)
        } else {
            0
        }
    }

    fn fill(&mut self, state: StateId, amount: u32, simulate: bool) -> u32 {
        if self.registry.kind(state) != VoxelKind::Fluid {
            return 0;
        }
        let stored = self.store(state, self.mb_to_bits(amount), simulate);
        self.bits_to_mb(stored)
    }

    fn drain(&mut self, max_amount: u32, simulate: bool) -> Option<(StateId, u32)> {
        if !self.is_fluid() {
            return None;
        }
        let (state, bits) = self.take(self.mb_to_bits(max_amount), simulate)?;
        Some((state, self.bits_to_mb(bits)))
    }
}

impl BitInventory for BitStorage {
    fn available(&self, state: StateId) -> usize {
        if self.state == Some(state) { self.bits } else { 0 }
    }

    fn space_for(&self, state: StateId) -> usize {
        if self.accepts(state) {
            self.capacity - self.bits
        } else {
            0
        }
    }

    fn insert(&mut self, state: StateId, count: usize) -> usize {
        self.store(state, count, false)
    }

    fn extract(&mut self, state: StateId, count: usize) -> usize {
        if self.state != Some(state) {
            return 0;
        }
        self.take(count, false).map_or(0, |(_, n)| n)
    }
}
