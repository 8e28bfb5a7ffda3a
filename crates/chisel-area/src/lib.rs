//! World-relative access to chiseled containers: area mutators, batched
//! edits, pattern placement, chisel tools and bit inventories.
#![forbid(unsafe_code)]

pub mod batch;
pub mod change;
pub mod chisel;
pub mod container;
pub mod error;
pub mod hooks;
pub mod inventory;
pub mod mutator;
pub mod placement;
pub mod storage;
pub mod world;

pub use batch::BatchMutation;
pub use change::{ActorId, BitChange, ChangeSet, ChangeSink, NullSink};
pub use chisel::{BitCounts, ChiselMode, ChiselOperation, chisel};
pub use container::ChiseledBlock;
pub use error::MutationError;
pub use hooks::{AllowAll, Authorizer, ContainerListener, NullListener};
pub use inventory::{BagInventory, BitInventory};
pub use mutator::{StateEntryInfo, WorldAreaMutator};
pub use placement::{PlacementFailure, PlacementMode, PlacementResult, place_pattern};
pub use storage::{BitStorage, Capability, CapabilitySet, FluidContainer, ItemContainer};
pub use world::{BlobWorld, WorldSettings};
