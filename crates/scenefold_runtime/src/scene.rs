//! A world bound to its entity folders.
//!
//! [`Scene`] owns both halves and forwards entity lifecycle events to the
//! folder manager as they happen. Folder callbacks only ever see the world
//! as a [`PartitionHost`](scenefold_storage::PartitionHost), which cannot
//! create or destroy entities, so a callback can never re-enter the
//! lifecycle it was called from.

use scenefold_folders::{EntityFolders, FoldersConfig};
use scenefold_foundation::{EntityMap, EntityRef, Error, FolderId, PartitionHandle, Result};
use scenefold_storage::World;

/// A world together with the folder hierarchy organizing its entities.
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) world: World,
    pub(crate) folders: EntityFolders,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(FoldersConfig::default())
    }
}

impl Scene {
    /// Creates an empty scene with one partition and its root folder.
    #[must_use]
    pub fn new(config: FoldersConfig) -> Self {
        let world = World::new();
        let folders = EntityFolders::new(&world, config);
        Self { world, folders }
    }

    /// The underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The folder hierarchy.
    #[must_use]
    pub fn folders(&self) -> &EntityFolders {
        &self.folders
    }

    /// Gives up the scene, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (World, EntityFolders) {
        (self.world, self.folders)
    }

    // --- Entities ---

    /// Creates an entity in the active partition and files it in the
    /// selected folder.
    pub fn create_entity(&mut self) -> EntityRef {
        let entity = self.world.create_entity();
        self.folders.on_entity_created(entity, &mut self.world);
        entity
    }

    /// Destroys an entity and removes it from its folder.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not alive.
    pub fn destroy_entity(&mut self, entity: EntityRef) -> Result<()> {
        self.world.destroy_entity(entity)?;
        self.folders.on_entity_destroyed(entity);
        Ok(())
    }

    /// Moves an entity into a folder, changing its partition if needed.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not alive.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist.
    pub fn move_to_folder(&mut self, entity: EntityRef, folder: FolderId) -> Result<()> {
        if !self.world.exists(entity) {
            return Err(Error::entity_not_found(entity));
        }
        self.folders.move_to_folder(entity, folder, &mut self.world);
        Ok(())
    }

    /// Runs `f` with new entities left out of every folder.
    ///
    /// The previous setting is restored afterwards.
    pub fn with_new_entities_ignored<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.folders.ignores_new_entities();
        self.folders.set_ignore_new_entities(true);
        let result = f(self);
        self.folders.set_ignore_new_entities(previous);
        result
    }

    // --- Folders ---

    /// Creates a folder under `parent`. See [`EntityFolders::emplace_folder`].
    pub fn emplace_folder(&mut self, requested: Option<FolderId>, parent: FolderId) -> FolderId {
        self.folders.emplace_folder(requested, parent)
    }

    /// Removes an empty, non-root folder. See [`EntityFolders::destroy_folder`].
    pub fn destroy_folder(&mut self, folder: FolderId) {
        self.folders.destroy_folder(folder);
        self.sync_active_partition();
    }

    /// Renames a folder.
    pub fn rename_folder(&mut self, folder: FolderId, name: &str) {
        self.folders.rename_folder(folder, name);
    }

    /// Selects a folder, making its partition the active one.
    pub fn select_folder(&mut self, folder: FolderId) {
        self.folders.select_folder(folder, &mut self.world);
    }

    // --- Partitions ---

    /// Creates a partition with an empty root folder.
    ///
    /// The active partition and the selection are unchanged.
    pub fn create_partition(&mut self, name: impl Into<String>) -> PartitionHandle {
        let partition = self.world.create_partition(name);
        self.folders.ensure_root(partition);
        partition
    }

    /// Tears down a partition: its entities, its folders, then the
    /// partition itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is unknown or is the last one.
    /// Nothing is destroyed in that case.
    pub fn destroy_partition(&mut self, partition: PartitionHandle) -> Result<()> {
        if !self.world.has_partition(partition) {
            return Err(Error::unknown_partition(partition));
        }
        if self.world.partitions().len() == 1 {
            return Err(Error::integrity("cannot destroy the last partition"));
        }

        let doomed: Vec<EntityRef> = self.world.partition_entities(partition).collect();
        for entity in &doomed {
            self.destroy_entity(*entity)?;
        }
        self.folders.destroy_partition_folders(partition);
        self.world.destroy_partition(partition)?;
        self.sync_active_partition();

        tracing::debug!(%partition, entities = doomed.len(), "tore down partition");
        Ok(())
    }

    /// Copies one partition into a new scene.
    ///
    /// The copy holds the partition's live entities in its default
    /// partition, with the same folder tree. Returns the copy and the map
    /// from this scene's entities to the copy's.
    #[must_use]
    pub fn clone_partition(&self, partition: PartitionHandle) -> (Scene, EntityMap) {
        let mut dst = Scene::new(self.folders.config().clone());
        let map: EntityMap = dst.with_new_entities_ignored(|dst| {
            self.world
                .partition_entities(partition)
                .map(|src| (src, dst.create_entity()))
                .collect()
        });

        self.folders.clone_to(&mut dst.folders, partition, &map);
        if partition != PartitionHandle::DEFAULT {
            if let Some(root) = dst.folders.root(partition) {
                dst.folders.retag_partition(root, PartitionHandle::DEFAULT);
            }
        }
        let root = dst.folders.ensure_root(PartitionHandle::DEFAULT);
        if dst.folders.selected_folder().is_none() {
            dst.select_folder(root);
        }

        tracing::debug!(%partition, entities = map.len(), "cloned partition");
        (dst, map)
    }

    /// Makes the world's active partition follow the selected folder.
    pub(crate) fn sync_active_partition(&mut self) {
        if let Some(selected) = self.folders.selected_folder() {
            self.folders.select_folder(selected, &mut self.world);
        }
    }
}
