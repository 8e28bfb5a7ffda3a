use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use chisel_area::{
    ActorId, BagInventory, BitInventory, BlobWorld, ChangeSet, ChiselMode, ChiselOperation,
    MutationError, NullSink, PlacementFailure, PlacementMode, WorldAreaMutator, WorldSettings,
    chisel, place_pattern,
};
use chisel_blob::{BlobRef, BlobVersion, VoxelBlob};
use chisel_blocks::{AIR, StateRegistry};
use chisel_geom::{BitBox, BitPos, BlockPos};

const STONE: u32 = 1;
const DIRT: u32 = 2;

fn registry() -> Arc<StateRegistry> {
    let toml = r#"
        [[states]]
        name = "stone"
        id = 1
        [[states]]
        name = "dirt"
        id = 2
    "#;
    Arc::new(StateRegistry::from_toml_str(toml).unwrap())
}

fn settings() -> WorldSettings {
    WorldSettings {
        side: 4,
        ..WorldSettings::default()
    }
}

fn world_with_log() -> (BlobWorld, Rc<RefCell<Vec<BlockPos>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let world = BlobWorld::new(registry(), settings())
        .unwrap()
        .with_listener(move |b: BlockPos| sink.borrow_mut().push(b));
    (world, log)
}

#[test]
fn unbatched_writes_notify_each_time() {
    let (mut world, log) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::new(0, 0, 0), BitPos::new(3, 3, 3));
    m.set_in_area(STONE, BitPos::new(0, 0, 0)).unwrap();
    m.set_in_area(STONE, BitPos::new(1, 0, 0)).unwrap();
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(world.state_at(BitPos::new(1, 0, 0)), STONE);
}

#[test]
fn batch_notifies_once_per_container_and_records_net_change() {
    let (mut world, log) = world_with_log();
    let mut changes: Vec<ChangeSet> = Vec::new();
    {
        let mut m =
            WorldAreaMutator::covering(&mut world, BitPos::new(-2, 0, 0), BitPos::new(5, 0, 0))
                .with_actor(ActorId(7));
        let mut batch = m.batch(&mut changes);
        for x in -2..=5 {
            batch.set_in_area(STONE, BitPos::new(x, 0, 0)).unwrap();
        }
        // overwritten in the same batch: only the net result is recorded
        batch.override_in_area(DIRT, BitPos::new(0, 0, 0)).unwrap();
        assert!(log.borrow().is_empty());
        // batch readers see uncommitted writes
        assert_eq!(batch.get_in_area(BitPos::new(0, 0, 0)).unwrap().state, DIRT);
    }
    let mut notified = log.borrow().clone();
    notified.sort();
    assert_eq!(
        notified,
        vec![BlockPos::new(-1, 0, 0), BlockPos::new(0, 0, 0), BlockPos::new(1, 0, 0)]
    );
    assert_eq!(changes.len(), 1);
    let set = &changes[0];
    assert_eq!(set.actor, ActorId(7));
    assert_eq!(set.entries.len(), 8);
    let origin = set.entries.iter().find(|e| e.pos == BitPos::new(0, 0, 0)).unwrap();
    assert_eq!((origin.before, origin.after), (AIR, DIRT));
}

#[test]
fn batch_commits_on_early_return() {
    fn fill(world: &mut BlobWorld, sink: &mut Vec<ChangeSet>) -> Result<(), MutationError> {
        let mut m = WorldAreaMutator::covering(world, BitPos::new(0, 0, 0), BitPos::new(1, 0, 0));
        let mut batch = m.batch(sink);
        batch.set_in_area(STONE, BitPos::new(0, 0, 0))?;
        batch.set_in_area(STONE, BitPos::new(2, 0, 0))?;
        Ok(())
    }
    let (mut world, log) = world_with_log();
    let mut changes = Vec::new();
    let err = fill(&mut world, &mut changes).unwrap_err();
    assert!(matches!(err, MutationError::OutsideArea { .. }));
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(changes.len(), 1);
    assert_eq!(world.state_at(BitPos::new(0, 0, 0)), STONE);
}

#[test]
fn occupied_and_outside() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::new(0, 0, 0), BitPos::new(3, 3, 3));
    let p = BitPos::new(2, 2, 2);
    m.set_in_area(STONE, p).unwrap();
    assert_eq!(
        m.set_in_area(DIRT, p),
        Err(MutationError::SpaceOccupied { pos: p, state: STONE })
    );
    m.clear_in_area(p).unwrap();
    m.set_in_area(DIRT, p).unwrap();
    assert_eq!(m.get_in_area(p).unwrap().state, DIRT);
    assert_eq!(
        m.set_in_area(STONE, p),
        Err(MutationError::SpaceOccupied { pos: p, state: DIRT })
    );
    m.override_in_area(STONE, p).unwrap();
    assert_eq!(m.get_in_area(p).unwrap().state, STONE);
    assert!(m.get_in_area(BitPos::new(4, 0, 0)).is_none());
    assert!(!m.is_inside(BitPos::new(-1, 0, 0)));
    assert_eq!(m.entries().count(), 64);
    assert_eq!(m.entries().filter(|e| e.state != AIR).count(), 1);
}

#[test]
fn unauthorized_actor_is_rejected() {
    let mut world = BlobWorld::new(registry(), settings())
        .unwrap()
        .with_authorizer(|actor: ActorId, block: BlockPos| actor == ActorId(1) || block.x < 0);
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::new(-4, 0, 0), BitPos::new(3, 0, 0))
        .with_actor(ActorId(2));
    assert!(m.set_in_area(STONE, BitPos::new(-1, 0, 0)).is_ok());
    assert_eq!(
        m.set_in_area(STONE, BitPos::new(1, 0, 0)),
        Err(MutationError::Unauthorized {
            actor: ActorId(2),
            block: BlockPos::new(0, 0, 0)
        })
    );
}

#[test]
fn emptied_containers_are_removed() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::new(0, 0, 0), BitPos::new(0, 0, 0));
    m.set_in_area(STONE, BitPos::ORIGIN).unwrap();
    m.clear_in_area(BitPos::ORIGIN).unwrap();
    assert!(world.is_empty());
}

#[test]
fn container_metadata_tracks_contents() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::new(0, 0, 0), BitPos::new(3, 3, 3));
    let mut sink = NullSink;
    {
        let mut batch = m.batch(&mut sink);
        for p in chisel_geom::BitBox::new(BitPos::new(0, 0, 0), BitPos::new(3, 3, 3)).iter() {
            batch.set_in_area(STONE, p).unwrap();
        }
        batch.override_in_area(DIRT, BitPos::ORIGIN).unwrap();
    }
    let c = world.container(BlockPos::new(0, 0, 0)).unwrap();
    assert_eq!(c.primary_state, STONE);
    assert!((c.opacity - 1.0).abs() < 1e-6);
    assert!(!c.has_pending());
}

#[test]
fn full_block_covers_every_face_at_any_side() {
    for side in [1, 2, 4, 8, 16] {
        let settings = WorldSettings {
            side,
            ..WorldSettings::default()
        };
        let mut world = BlobWorld::new(registry(), settings).unwrap();
        let end = BitPos::new(side as i64 - 1, side as i64 - 1, side as i64 - 1);
        let mut m = WorldAreaMutator::covering(&mut world, BitPos::ORIGIN, end);
        let mut sink = NullSink;
        {
            let mut batch = m.batch(&mut sink);
            for p in BitBox::new(BitPos::ORIGIN, end).iter() {
                batch.set_in_area(STONE, p).unwrap();
            }
        }
        let c = world.container(BlockPos::new(0, 0, 0)).unwrap();
        assert_eq!(c.side_flags, 0b11_1111, "side {side}");
    }
}

#[test]
fn legacy_overflow_publishes_paletted_and_keeps_the_write() {
    let settings = WorldSettings {
        side: 4,
        version: BlobVersion::Legacy,
        ..WorldSettings::default()
    };
    let mut world = BlobWorld::new(registry(), settings).unwrap();
    let mut changes: Vec<ChangeSet> = Vec::new();
    {
        let mut m = WorldAreaMutator::covering(&mut world, BitPos::ORIGIN, BitPos::new(1, 0, 0));
        let mut batch = m.batch(&mut changes);
        batch.set_in_area(20, BitPos::ORIGIN).unwrap();
        batch.set_in_area(STONE, BitPos::new(1, 0, 0)).unwrap();
    }
    assert_eq!(world.state_at(BitPos::ORIGIN), 20);
    let c = world.container(BlockPos::new(0, 0, 0)).unwrap();
    assert!(!c.has_pending());
    assert_eq!(c.blob().version(), BlobVersion::Paletted);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].entries.len(), 2);

    // small ids still use the configured layout
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::new(4, 0, 0), BitPos::new(4, 0, 0));
    m.set_in_area(STONE, BitPos::new(4, 0, 0)).unwrap();
    let c = world.container(BlockPos::new(1, 0, 0)).unwrap();
    assert_eq!(c.blob().version(), BlobVersion::Legacy);
}

fn pattern() -> BlobRef {
    let mut b = VoxelBlob::new(4).unwrap();
    b.set(0, 0, 0, STONE).unwrap();
    b.set(1, 0, 0, STONE).unwrap();
    b.set(2, 0, 0, DIRT).unwrap();
    BlobRef::from_blob(b, BlobVersion::Paletted).unwrap()
}

#[test]
fn place_mode_refuses_overlap() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::ORIGIN, BitPos::ORIGIN);
    m.set_in_area(DIRT, BitPos::ORIGIN).unwrap();
    let r = place_pattern(
        &mut world,
        &mut NullSink,
        ActorId(1),
        &pattern(),
        BitPos::ORIGIN,
        PlacementMode::Place,
        false,
        None,
    );
    assert!(!r.is_success());
    assert_eq!(r.color(), PlacementFailure::NotFitting.color());

    let ok = place_pattern(
        &mut world,
        &mut NullSink,
        ActorId(1),
        &pattern(),
        BitPos::new(4, 0, 0),
        PlacementMode::Place,
        false,
        None,
    );
    assert!(ok.is_success());
    assert_eq!(world.state_at(BitPos::new(6, 0, 0)), DIRT);
}

#[test]
fn merge_accounts_bits_and_space() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::ORIGIN, BitPos::new(2, 0, 0));
    m.set_in_area(DIRT, BitPos::ORIGIN).unwrap();
    m.set_in_area(DIRT, BitPos::new(2, 0, 0)).unwrap();

    // needs two stone; the dirt at x=2 already matches
    let mut poor = BagInventory::unbounded().with_bits(STONE, 1);
    let r = place_pattern(
        &mut world,
        &mut NullSink,
        ActorId(1),
        &pattern(),
        BitPos::ORIGIN,
        PlacementMode::Merge,
        false,
        Some(&mut poor),
    );
    assert_eq!(
        r.color(),
        PlacementFailure::MissingBitsOrSpace.color()
    );

    let mut bag = BagInventory::unbounded().with_bits(STONE, 2);
    let sim = place_pattern(
        &mut world,
        &mut NullSink,
        ActorId(1),
        &pattern(),
        BitPos::ORIGIN,
        PlacementMode::Merge,
        true,
        Some(&mut bag),
    );
    assert!(sim.is_success());
    assert_eq!(bag.available(STONE), 2);
    assert_eq!(world.state_at(BitPos::ORIGIN), DIRT);

    let r = place_pattern(
        &mut world,
        &mut NullSink,
        ActorId(1),
        &pattern(),
        BitPos::ORIGIN,
        PlacementMode::Merge,
        false,
        Some(&mut bag),
    );
    assert!(r.is_success());
    assert_eq!(bag.available(STONE), 0);
    assert_eq!(bag.available(DIRT), 1);
    assert_eq!(world.state_at(BitPos::ORIGIN), STONE);
}

#[test]
fn impose_replaces_identical_bits_too() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::ORIGIN, BitPos::new(2, 0, 0));
    m.set_in_area(DIRT, BitPos::new(2, 0, 0)).unwrap();
    let mut bag = BagInventory::unbounded().with_bits(STONE, 2).with_bits(DIRT, 1);
    let mut changes = Vec::new();
    let r = place_pattern(
        &mut world,
        &mut changes,
        ActorId(1),
        &pattern(),
        BitPos::ORIGIN,
        PlacementMode::Impose,
        false,
        Some(&mut bag),
    );
    assert!(r.is_success());
    // the dirt bit went out and came back in
    assert_eq!(bag.available(DIRT), 1);
    assert_eq!(bag.available(STONE), 0);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].entries.len(), 2);
}

#[test]
fn impose_over_identical_bits_needs_no_space() {
    let (mut world, _) = world_with_log();
    let mut m = WorldAreaMutator::covering(&mut world, BitPos::ORIGIN, BitPos::new(2, 0, 0));
    m.set_in_area(DIRT, BitPos::new(2, 0, 0)).unwrap();
    // no room left for dirt, but the dirt bit is replaced by dirt
    let mut bag = BagInventory::with_cap(2).with_bits(STONE, 2).with_bits(DIRT, 2);
    let r = place_pattern(
        &mut world,
        &mut NullSink,
        ActorId(1),
        &pattern(),
        BitPos::ORIGIN,
        PlacementMode::Impose,
        false,
        Some(&mut bag),
    );
    assert!(r.is_success());
    assert_eq!(bag.available(DIRT), 2);
    assert_eq!(bag.available(STONE), 0);
    assert_eq!(world.state_at(BitPos::new(1, 0, 0)), STONE);
}

#[test]
fn interrupted_placing_charges_only_placed_bits() {
    // the authorizer starts refusing partway through the write loop
    let calls = Cell::new(0usize);
    let mut world = BlobWorld::new(registry(), settings())
        .unwrap()
        .with_authorizer(move |_: ActorId, _: BlockPos| {
            calls.set(calls.get() + 1);
            calls.get() <= 11
        });
    let mut bag = BagInventory::unbounded().with_bits(DIRT, 8);
    let err = chisel(
        &mut world,
        &mut NullSink,
        ActorId(1),
        ChiselMode::Cube { size: 2 },
        ChiselOperation::Place(DIRT),
        BitPos::ORIGIN,
        Some(&mut bag),
    )
    .unwrap_err();
    assert!(matches!(err, MutationError::Unauthorized { .. }));
    let placed = BitBox::new(BitPos::ORIGIN, BitPos::new(1, 1, 1))
        .iter()
        .filter(|&p| world.state_at(p) == DIRT)
        .count();
    assert_eq!(placed, 3);
    assert_eq!(bag.available(DIRT), 5);
}

#[test]
fn sphere_chisel_tallies_removed_bits() {
    let (mut world, _) = world_with_log();
    let full = VoxelBlob::filled(4, STONE).unwrap();
    world.insert_container(
        BlockPos::new(0, 0, 0),
        BlobRef::from_blob(full, BlobVersion::Compact).unwrap(),
    );
    let mode = ChiselMode::Sphere { diameter: 3 };
    let shape = mode.positions(BitPos::new(1, 1, 1));
    // 3x3x3 cube minus its eight corners
    assert_eq!(shape.len(), 19);

    let mut bag = BagInventory::unbounded();
    let mut changes = Vec::new();
    let counts = chisel(
        &mut world,
        &mut changes,
        ActorId(3),
        mode,
        ChiselOperation::Chisel,
        BitPos::new(1, 1, 1),
        Some(&mut bag),
    )
    .unwrap();
    assert_eq!(counts.get(STONE), 19);
    assert_eq!(bag.available(STONE), 19);
    assert_eq!(world.state_at(BitPos::new(1, 1, 1)), AIR);
    assert_eq!(world.state_at(BitPos::new(0, 0, 0)), STONE);
    assert_eq!(changes[0].entries.len(), 19);
}

#[test]
fn placing_needs_every_bit() {
    let (mut world, _) = world_with_log();
    let mode = ChiselMode::Cube { size: 2 };
    let mut bag = BagInventory::unbounded().with_bits(DIRT, 7);
    let err = chisel(
        &mut world,
        &mut NullSink,
        ActorId(1),
        mode,
        ChiselOperation::Place(DIRT),
        BitPos::ORIGIN,
        Some(&mut bag),
    )
    .unwrap_err();
    assert!(matches!(err, MutationError::MissingBits { needed: 8, available: 7, .. }));
    assert!(world.is_empty());

    bag.insert(DIRT, 1);
    let counts = chisel(
        &mut world,
        &mut NullSink,
        ActorId(1),
        mode,
        ChiselOperation::Place(DIRT),
        BitPos::ORIGIN,
        Some(&mut bag),
    )
    .unwrap();
    assert_eq!(counts.total(), 8);
    assert_eq!(bag.available(DIRT), 0);
}
