use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use chisel_area::{BlobWorld, ChangeSet, WorldAreaMutator, WorldSettings};
use chisel_blocks::StateRegistry;
use chisel_geom::{BitPos, BlockPos};
use proptest::prelude::*;

fn write() -> impl Strategy<Value = (BitPos, u32)> {
    ((-6i64..6, -6i64..6, -6i64..6), 0u32..4).prop_map(|((x, y, z), s)| (BitPos::new(x, y, z), s))
}

proptest! {
    // one notification per touched container, one entry per net-changed bit
    #[test]
    fn batch_coalesces(writes in proptest::collection::vec(write(), 1..60)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let settings = WorldSettings { side: 4, ..WorldSettings::default() };
        let mut world = BlobWorld::new(Arc::new(StateRegistry::new()), settings)
            .unwrap()
            .with_listener(move |b: BlockPos| l.borrow_mut().push(b));
        let mut changes: Vec<ChangeSet> = Vec::new();
        {
            let mut m = WorldAreaMutator::covering(
                &mut world,
                BitPos::new(-6, -6, -6),
                BitPos::new(5, 5, 5),
            );
            let mut batch = m.batch(&mut changes);
            for &(p, s) in &writes {
                batch.override_in_area(s, p).unwrap();
            }
        }

        let notified = log.borrow();
        let unique: HashSet<BlockPos> = notified.iter().copied().collect();
        prop_assert_eq!(unique.len(), notified.len());

        let mut last = std::collections::HashMap::new();
        for &(p, s) in &writes {
            last.insert(p, s);
        }
        let changed: Vec<(BitPos, u32)> = last.into_iter().filter(|&(_, s)| s != 0).collect();
        let recorded = changes.first().map_or(0, |c| c.entries.len());
        prop_assert_eq!(recorded, changed.len());
        for (p, s) in changed {
            prop_assert_eq!(world.state_at(p), s);
        }
    }
}
