//! Host callbacks: change notification and edit permission.

use chisel_geom::BlockPos;

use crate::change::ActorId;

pub trait ContainerListener {
    fn on_container_changed(&mut self, block: BlockPos);
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullListener;

impl ContainerListener for NullListener {
    fn on_container_changed(&mut self, _block: BlockPos) {}
}

impl<F: FnMut(BlockPos)> ContainerListener for F {
    fn on_container_changed(&mut self, block: BlockPos) {
        self(block)
    }
}

pub trait Authorizer {
    fn can_edit_position(&self, actor: ActorId, block: BlockPos) -> bool;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can_edit_position(&self, _actor: ActorId, _block: BlockPos) -> bool {
        true
    }
}

impl<F: Fn(ActorId, BlockPos) -> bool> Authorizer for F {
    fn can_edit_position(&self, actor: ActorId, block: BlockPos) -> bool {
        self(actor, block)
    }
}
