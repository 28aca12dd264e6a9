//! Integration tests for Layer 2: Folders
//!
//! Tests for the folder tree, entity membership, and the binary codec,
//! driven through a real storage world.

mod codec;
mod properties;

use scenefold_folders::{EntityFolders, FoldersConfig};
use scenefold_foundation::{EntityRef, FolderId, PartitionHandle};
use scenefold_storage::World;

/// A world and manager with a deterministic ID stream.
pub fn setup() -> (World, EntityFolders, FolderId) {
    let world = World::new();
    let folders = EntityFolders::new(&world, FoldersConfig::deterministic(0x5eed));
    let root = folders.root(PartitionHandle::DEFAULT).unwrap();
    (world, folders, root)
}

/// Creates an entity and notifies the manager, as a bound scene would.
pub fn spawn(world: &mut World, folders: &mut EntityFolders) -> EntityRef {
    let e = world.create_entity();
    folders.on_entity_created(e, world);
    e
}

/// Member list of a folder, head first.
pub fn members(folders: &EntityFolders, id: FolderId) -> Vec<EntityRef> {
    folders.entities(id).collect()
}

/// Member list of a folder walked backwards from its tail.
pub fn members_backwards(folders: &EntityFolders, id: FolderId) -> Vec<EntityRef> {
    let mut out = Vec::new();
    let mut cursor = folders.entities(id).last();
    while let Some(e) = cursor {
        out.push(e);
        cursor = folders.prev_entity(e);
    }
    out
}
