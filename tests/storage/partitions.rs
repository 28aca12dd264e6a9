//! Integration tests for partitions

use scenefold_foundation::{ErrorKind, PartitionHandle};
use scenefold_storage::{PartitionHost, World};

#[test]
fn new_world_has_one_active_partition() {
    let world = World::new();
    assert_eq!(world.partitions().len(), 1);
    assert_eq!(world.active_partition(), PartitionHandle::DEFAULT);
}

#[test]
fn entities_follow_the_active_partition() {
    let mut world = World::new();
    let level = world.create_partition("level");
    let before = world.create_entity();
    world.set_active_partition(level);
    let after = world.create_entity();

    assert_eq!(world.partition_of(before), Some(PartitionHandle::DEFAULT));
    assert_eq!(world.partition_of(after), Some(level));
    assert_eq!(world.partition_entities(level).collect::<Vec<_>>(), vec![after]);
}

#[test]
fn set_partition_moves_entity() {
    let mut world = World::new();
    let level = world.create_partition("level");
    let e = world.create_entity();

    world.set_partition(e, level);
    assert_eq!(world.partition_of(e), Some(level));
}

#[test]
#[should_panic(expected = "unknown Partition(9)")]
fn activating_unknown_partition_panics() {
    let mut world = World::new();
    world.set_active_partition(PartitionHandle(9));
}

#[test]
fn partitions_with_entities_cannot_be_destroyed() {
    let mut world = World::new();
    let level = world.create_partition("level");
    world.set_active_partition(level);
    world.create_entity();

    let err = world.destroy_partition(level).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::PartitionNotEmpty { entities: 1, .. }
    ));
}

#[test]
fn destroying_active_partition_falls_back() {
    let mut world = World::new();
    let level = world.create_partition("level");
    world.set_active_partition(level);

    world.destroy_partition(level).unwrap();
    assert!(!world.has_partition(level));
    assert_eq!(world.active_partition(), PartitionHandle::DEFAULT);
}

#[test]
fn last_partition_cannot_be_destroyed() {
    let mut world = World::new();
    assert!(world.destroy_partition(PartitionHandle::DEFAULT).is_err());
}

#[test]
fn unknown_partition_cannot_be_destroyed() {
    let mut world = World::new();
    let err = world.destroy_partition(PartitionHandle(5)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownPartition(_)));
}

#[test]
fn partition_names_are_kept() {
    let mut world = World::new();
    let level = world.create_partition("level");
    assert_eq!(world.partition_name(level), Some("level"));
    assert_eq!(world.partition_name(PartitionHandle(7)), None);
}
