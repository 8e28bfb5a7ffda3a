use chisel_blocks::{AIR, StateId};
use hashbrown::HashMap;

/// Source and sink of loose bits for survival-mode tools.
pub trait BitInventory {
    fn available(&self, state: StateId) -> usize;

    /// How many more bits of `state` fit.
    fn space_for(&self, state: StateId) -> usize;

    /// Returns how many bits were actually stored.
    fn insert(&mut self, state: StateId, count: usize) -> usize;

    /// Returns how many bits were actually removed.
    fn extract(&mut self, state: StateId, count: usize) -> usize;
}

/// Per-state counters with a per-state cap.
#[derive(Clone, Debug, Default)]
pub struct BagInventory {
    counts: HashMap<StateId, usize>,
    cap: Option<usize>,
}

impl BagInventory {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            counts: HashMap::new(),
            cap: Some(cap),
        }
    }

    pub fn with_bits(mut self, state: StateId, count: usize) -> Self {
        self.insert(state, count);
        self
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl BitInventory for BagInventory {
    fn available(&self, state: StateId) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    fn space_for(&self, state: StateId) -> usize {
        if state == AIR {
            return 0;
        }
        match self.cap {
            Some(cap) => cap.saturating_sub(self.available(state)),
            None => usize::MAX,
        }
    }

    fn insert(&mut self, state: StateId, count: usize) -> usize {
        let n = count.min(self.space_for(state));
        if n > 0 {
            *self.counts.entry(state).or_insert(0) += n;
        }
        n
    }

    fn extract(&mut self, state: StateId, count: usize) -> usize {
        let Some(have) = self.counts.get_mut(&state) else {
            return 0;
        };
        let n = count.min(*have);
        *have -= n;
        if *have == 0 {
            self.counts.remove(&state);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_limits_inserts() {
        let mut bag = BagInventory::with_cap(10);
        assert_eq!(bag.insert(1, 7), 7);
        assert_eq!(bag.insert(1, 7), 3);
        assert_eq!(bag.space_for(1), 0);
        assert_eq!(bag.space_for(2), 10);
        assert_eq!(bag.insert(AIR, 5), 0);
        assert_eq!(bag.extract(1, 4), 4);
        assert_eq!(bag.available(1), 6);
        assert_eq!(bag.extract(9, 1), 0);
    }
}
