use std::ops::{Deref, DerefMut};

use crate::change::ChangeSink;
use crate::mutator::{Pending, WorldAreaMutator};

/// Scoped batch over a mutator. Dropping the guard publishes and notifies
/// each touched container once and records one [`crate::ChangeSet`]; there
/// is no rollback.
pub struct BatchMutation<'m, 'w> {
    mutator: &'m mut WorldAreaMutator<'w>,
    sink: &'m mut dyn ChangeSink,
}

impl<'m, 'w> BatchMutation<'m, 'w> {
    pub(crate) fn open(
        mutator: &'m mut WorldAreaMutator<'w>,
        sink: &'m mut dyn ChangeSink,
    ) -> Self {
        mutator.pending = Some(Pending::default());
        Self { mutator, sink }
    }
}

impl<'w> Deref for BatchMutation<'_, 'w> {
    type Target = WorldAreaMutator<'w>;

    fn deref(&self) -> &Self::Target {
        &*self.mutator
    }
}

impl<'w> DerefMut for BatchMutation<'_, 'w> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.mutator
    }
}

impl Drop for BatchMutation<'_, '_> {
    fn drop(&mut self) {
        self.mutator.commit(&mut *self.sink);
    }
}
