//! Integration tests for folder serialization and cloning

use scenefold_folders::{ENTITY_RECORD_SIZE, EntityFolders, FOLDER_RECORD_SIZE, FoldersConfig};
use scenefold_foundation::{
    EntityMap, EntityRef, ErrorKind, FolderId, FormatVersion, InputBlob, OutputBlob,
    PartitionHandle,
};
use scenefold_storage::World;

use crate::{members, setup, spawn};

/// Root with two children; entities spread over all three folders.
fn populated() -> (World, EntityFolders, Vec<FolderId>) {
    let (mut world, mut folders, root) = setup();
    let a = folders.emplace_folder(None, root);
    let b = folders.emplace_folder(None, a);
    folders.rename_folder(b, "lights");
    for target in [root, a, b, a, root, b] {
        folders.select_folder(target, &mut world);
        spawn(&mut world, &mut folders);
    }
    folders.select_folder(root, &mut world);
    (world, folders, vec![root, a, b])
}

fn to_blob(folders: &EntityFolders) -> Vec<u8> {
    let mut out = OutputBlob::new();
    folders.serialize(&mut out);
    out.into_bytes()
}

fn empty_manager() -> EntityFolders {
    EntityFolders::new(&World::new(), FoldersConfig::deterministic(77))
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn serialized_size_matches_layout() {
    let (_, folders, _) = populated();
    let bytes = to_blob(&folders);

    assert_eq!(
        bytes.len(),
        4 + folders.entity_capacity() * ENTITY_RECORD_SIZE + 4 + folders.len() * FOLDER_RECORD_SIZE
    );
    assert_eq!(FOLDER_RECORD_SIZE, 112);
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn identity_round_trip_reproduces_forest_and_lists() {
    let (world, folders, ids) = populated();
    let bytes = to_blob(&folders);

    let mut loaded = empty_manager();
    let summary = loaded
        .deserialize(
            &mut InputBlob::new(&bytes),
            &EntityMap::identity(6),
            false,
            FormatVersion::LATEST,
            &world,
        )
        .unwrap();

    assert_eq!(summary.entities, 6);
    assert_eq!(summary.roots, vec![ids[0]]);
    assert_eq!(loaded.folders(), folders.folders());
    for id in &ids {
        assert_eq!(members(&loaded, *id), members(&folders, *id));
    }
    assert_eq!(loaded.selected_folder(), Some(ids[0]));
    loaded.validate().unwrap();
}

#[test]
fn remapped_load_translates_entities() {
    let (world, folders, ids) = populated();
    let bytes = to_blob(&folders);
    let map: EntityMap = (0..6).map(|i| (EntityRef::new(i), EntityRef::new(i + 10))).collect();

    let mut loaded = empty_manager();
    loaded
        .deserialize(&mut InputBlob::new(&bytes), &map, false, FormatVersion::LATEST, &world)
        .unwrap();

    for id in &ids {
        let expected: Vec<_> = members(&folders, *id)
            .into_iter()
            .map(|e| map.get(e).unwrap())
            .collect();
        assert_eq!(members(&loaded, *id), expected);
    }
    assert_eq!(loaded.folder_of(EntityRef::new(0)), None);
}

#[test]
fn additive_load_keeps_existing_folders() {
    let (world, folders, ids) = populated();
    let bytes = to_blob(&folders);

    let (_, mut target, own_root) = setup();
    let map: EntityMap = (0..6).map(|i| (EntityRef::new(i), EntityRef::new(i + 1))).collect();
    let summary = target
        .deserialize(&mut InputBlob::new(&bytes), &map, true, FormatVersion::LATEST, &world)
        .unwrap();

    // Same seed, so the loaded root collides with the target's own root.
    assert_eq!(ids[0], own_root);
    assert!(target.contains(own_root));
    assert_eq!(summary.roots.len(), 1);
    assert_ne!(summary.roots[0], own_root);
    assert_eq!(target.len(), 1 + folders.len());
    assert_eq!(target.selected_folder(), Some(own_root));
}

// =============================================================================
// Malformed Input
// =============================================================================

#[test]
fn truncated_blob_leaves_manager_unchanged() {
    let (world, folders, _) = populated();
    let bytes = to_blob(&folders);

    let (_, mut target, root) = setup();
    let before = target.clone();
    for cut in [0, 3, 20, bytes.len() - 1] {
        let result = target.deserialize(
            &mut InputBlob::new(&bytes[..cut]),
            &EntityMap::identity(6),
            false,
            FormatVersion::LATEST,
            &world,
        );
        assert!(result.is_err(), "cut at {cut}");
    }
    assert_eq!(target.folders(), before.folders());
    assert_eq!(target.selected_folder(), Some(root));
}

#[test]
fn invalid_entity_pointer_is_rejected() {
    let world = World::new();
    let mut out = OutputBlob::new();
    out.write_u32(1);
    out.write_u64(0);
    out.write_i32(-5);
    out.write_i32(-1);
    out.write_u32(0);
    let bytes = out.into_bytes();

    let err = empty_manager()
        .deserialize(
            &mut InputBlob::new(&bytes),
            &EntityMap::identity(1),
            false,
            FormatVersion::LATEST,
            &world,
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidEntityPointer(-5)));
}

#[test]
fn huge_counts_are_rejected_without_allocating() {
    let world = World::new();
    let mut out = OutputBlob::new();
    out.write_u32(u32::MAX);
    let bytes = out.into_bytes();

    let err = empty_manager()
        .deserialize(
            &mut InputBlob::new(&bytes),
            &EntityMap::new(),
            false,
            FormatVersion::LATEST,
            &world,
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidLength { .. }));
}

// =============================================================================
// Legacy Format
// =============================================================================

fn legacy_blob(folder_records: i32, name_bytes: i32) -> Vec<u8> {
    let mut out = OutputBlob::new();
    out.write_i32(folder_records);
    out.write_zeros(12 * folder_records as usize);
    out.write_i32(name_bytes);
    out.write_zeros(name_bytes as usize);
    out.write_zeros(8);
    out.into_bytes()
}

#[test]
fn legacy_load_places_everything_in_one_folder() {
    let world = World::new();
    let bytes = legacy_blob(3, 10);
    let mut folders = empty_manager();
    let root = folders.root(PartitionHandle::DEFAULT).unwrap();

    folders
        .deserialize(
            &mut InputBlob::new(&bytes),
            &EntityMap::identity(3),
            false,
            FormatVersion::LegacyFolders,
            &world,
        )
        .unwrap();

    assert_eq!(folders.len(), 1);
    assert_eq!(members(&folders, root).len(), 3);
    folders.validate().unwrap();
}

#[test]
fn legacy_negative_count_is_rejected() {
    let world = World::new();
    let mut out = OutputBlob::new();
    out.write_i32(-1);
    let bytes = out.into_bytes();

    let result = empty_manager().deserialize(
        &mut InputBlob::new(&bytes),
        &EntityMap::new(),
        false,
        FormatVersion::Initial,
        &world,
    );
    assert!(result.is_err());
}

// =============================================================================
// Cloning
// =============================================================================

#[test]
fn clone_keeps_only_mapped_entities() {
    let (_, folders, ids) = populated();
    // Keep entities 0, 2 and 5 only.
    let map: EntityMap = [(0, 0), (2, 1), (5, 2)]
        .into_iter()
        .map(|(src, dst)| (EntityRef::new(src), EntityRef::new(dst)))
        .collect();

    let mut dst = empty_manager();
    folders.clone_to(&mut dst, PartitionHandle::DEFAULT, &map);

    assert_eq!(dst.entity_capacity(), 3);
    let mut seen = Vec::new();
    for id in &ids {
        for e in members(&dst, *id) {
            assert!(e.index < 3);
            seen.push(e);
        }
    }
    seen.sort();
    assert_eq!(seen, vec![EntityRef::new(0), EntityRef::new(1), EntityRef::new(2)]);
    for i in 0..3 {
        let link = dst.link(EntityRef::new(i)).unwrap();
        for neighbour in [link.next(), link.prev()].into_iter().flatten() {
            assert!(neighbour.index < 3);
        }
    }
    dst.validate().unwrap();
}

#[test]
fn clone_preserves_member_order() {
    let (_, folders, ids) = populated();
    let map = EntityMap::identity(6);

    let mut dst = empty_manager();
    folders.clone_to(&mut dst, PartitionHandle::DEFAULT, &map);

    for id in &ids {
        assert_eq!(members(&dst, *id), members(&folders, *id));
    }
}
