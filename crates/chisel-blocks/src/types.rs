use serde::{Deserialize, Serialize};

/// Identifier of a bit state in the external state table.
pub type StateId = u32;

/// Empty cell.
pub const AIR: StateId = 0;

/// What the voxel core needs to know about one state.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateProperties {
    pub is_air: bool,
    pub is_fluid: bool,
    /// Emitted light, 0..=15.
    pub light_value: u8,
    /// Opacity contribution of one cell, 0..=1.
    pub opacity: f32,
}

impl StateProperties {
    pub const AIR: StateProperties = StateProperties {
        is_air: true,
        is_fluid: false,
        light_value: 0,
        opacity: 0.0,
    };

    /// Used for ids the table does not know: solid, dark, opaque.
    pub const UNKNOWN: StateProperties = StateProperties {
        is_air: false,
        is_fluid: false,
        light_value: 0,
        opacity: 1.0,
    };

    #[inline]
    pub fn kind(&self) -> VoxelKind {
        if self.is_air {
            VoxelKind::Air
        } else if self.is_fluid {
            VoxelKind::Fluid
        } else {
            VoxelKind::Solid
        }
    }
}

/// Coarse classification of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VoxelKind {
    Air,
    Solid,
    Fluid,
}

/// Read-only lookup from state id to properties.
pub trait StateTable {
    fn properties(&self, id: StateId) -> Option<StateProperties>;

    /// Properties with the built-in fallbacks applied: id 0 is always air and
    /// unknown ids are treated as solid.
    #[inline]
    fn resolve(&self, id: StateId) -> StateProperties {
        if id == AIR {
            return StateProperties::AIR;
        }
        self.properties(id).unwrap_or(StateProperties::UNKNOWN)
    }

    #[inline]
    fn kind(&self, id: StateId) -> VoxelKind {
        self.resolve(id).kind()
    }
}
