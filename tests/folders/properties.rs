//! Property tests over random folder operations

use std::collections::HashSet;

use proptest::prelude::*;

use scenefold_folders::EntityFolders;
use scenefold_foundation::{
    EntityMap, EntityRef, FolderId, FormatVersion, InputBlob, OutputBlob, PartitionHandle,
};
use scenefold_storage::World;

use crate::{members, members_backwards, setup, spawn};

#[derive(Debug, Clone)]
enum Op {
    Spawn,
    Destroy(usize),
    Emplace(usize),
    Move(usize, usize),
    Select(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Spawn),
        1 => any::<usize>().prop_map(Op::Destroy),
        2 => any::<usize>().prop_map(Op::Emplace),
        4 => (any::<usize>(), any::<usize>()).prop_map(|(e, f)| Op::Move(e, f)),
        1 => any::<usize>().prop_map(Op::Select),
    ]
}

/// Replays `ops` against a fresh world, picking targets by index modulo the
/// live population.
fn replay(ops: &[Op]) -> (World, EntityFolders) {
    let (mut world, mut folders, _) = setup();
    for op in ops {
        let live: Vec<EntityRef> = world.entities().collect();
        let ids: Vec<FolderId> = folders.folders().iter().map(|f| f.id()).collect();
        match *op {
            Op::Spawn => {
                spawn(&mut world, &mut folders);
            }
            Op::Destroy(i) if !live.is_empty() => {
                let e = live[i % live.len()];
                world.destroy_entity(e).unwrap();
                folders.on_entity_destroyed(e);
            }
            Op::Emplace(i) => {
                folders.emplace_folder(None, ids[i % ids.len()]);
            }
            Op::Move(e, f) if !live.is_empty() => {
                folders.move_to_folder(live[e % live.len()], ids[f % ids.len()], &mut world);
            }
            Op::Select(i) => folders.select_folder(ids[i % ids.len()], &mut world),
            Op::Destroy(_) | Op::Move(..) => {}
        }
    }
    (world, folders)
}

proptest! {
    #[test]
    fn every_tracked_entity_is_listed_once(ops in prop::collection::vec(op(), 0..80)) {
        let (world, folders) = replay(&ops);
        folders.validate().unwrap();

        let mut listed = HashSet::new();
        for folder in folders.folders() {
            let forward = members(&folders, folder.id());
            let mut backward = members_backwards(&folders, folder.id());
            backward.reverse();
            prop_assert_eq!(&forward, &backward);
            for e in forward {
                prop_assert!(listed.insert(e));
                prop_assert_eq!(folders.folder_of(e), Some(folder.id()));
            }
        }
        for e in world.entities() {
            prop_assert!(listed.contains(&e));
        }
    }

    #[test]
    fn generated_ids_are_unique(seed_ops in prop::collection::vec(any::<usize>(), 1..150)) {
        let (_, mut folders, root) = setup();
        let mut ids = HashSet::from([root]);
        for pick in seed_ops {
            let existing: Vec<FolderId> = ids.iter().copied().collect();
            let parent = existing[pick % existing.len()];
            prop_assert!(ids.insert(folders.emplace_folder(None, parent)));
        }
        prop_assert_eq!(ids.len(), folders.len());
    }

    #[test]
    fn identity_round_trip(ops in prop::collection::vec(op(), 0..60)) {
        let (world, folders) = replay(&ops);
        let mut out = OutputBlob::new();
        folders.serialize(&mut out);
        let bytes = out.into_bytes();

        let map: EntityMap = world.entities().map(|e| (e, e)).collect();
        let (_, mut loaded, _) = setup();
        loaded
            .deserialize(&mut InputBlob::new(&bytes), &map, false, FormatVersion::LATEST, &world)
            .unwrap();

        prop_assert_eq!(loaded.folders(), folders.folders());
        for folder in folders.folders() {
            prop_assert_eq!(members(&loaded, folder.id()), members(&folders, folder.id()));
        }
        for e in world.entities() {
            prop_assert_eq!(loaded.folder_of(e), folders.folder_of(e));
        }
    }

    #[test]
    fn clone_references_only_mapped_entities(
        ops in prop::collection::vec(op(), 0..60),
        keep in prop::collection::vec(any::<bool>(), 60),
    ) {
        let (world, folders) = replay(&ops);
        let kept: Vec<EntityRef> = world
            .entities()
            .filter(|e| keep.get(e.slot()).copied().unwrap_or(true))
            .collect();
        let map: EntityMap = kept
            .iter()
            .zip(0u32..)
            .map(|(&src, dst)| (src, EntityRef::new(dst)))
            .collect();

        let (_, mut dst, _) = setup();
        folders.clone_to(&mut dst, PartitionHandle::DEFAULT, &map);
        dst.validate().unwrap();

        let listed: usize = dst.folders().iter().map(|f| dst.entities(f.id()).count()).sum();
        prop_assert_eq!(listed, kept.len());
        for folder in dst.folders() {
            for e in dst.entities(folder.id()) {
                prop_assert!(e.slot() < kept.len());
            }
        }
    }
}
