//! The folder manager: folder table, entity index, and selection.
//!
//! Misuse of the structure (unknown folders, destroying a folder that still
//! owns entities or children, constructing over a populated world) is a
//! caller bug and panics. Nothing here creates or destroys entities, so the
//! lifecycle handlers are safe to call from inside the world's own entity
//! management.

use std::collections::HashSet;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scenefold_foundation::{EntityRef, Error, FolderId, PartitionHandle, Result};
use scenefold_storage::PartitionHost;

use crate::config::FoldersConfig;
use crate::folder::{EntityLink, Folder, FolderName};

/// Organizes the entities of one world into a folder forest.
#[derive(Debug, Clone)]
pub struct EntityFolders {
    /// Linkage record per entity slot; grows on demand, never shrinks.
    pub(crate) entities: Vec<EntityLink>,
    /// Folder records in creation order.
    pub(crate) folders: Vec<Folder>,
    /// Folder new entities are placed in.
    pub(crate) selected: Option<FolderId>,
    /// Suppresses auto-placement of created entities during bulk loads.
    ignore_new_entities: bool,
    rng: ChaCha8Rng,
    pub(crate) config: FoldersConfig,
}

impl EntityFolders {
    /// Creates the manager for an empty world, with a selected root folder
    /// in the world's active partition.
    ///
    /// # Panics
    ///
    /// Panics if the world already contains entities.
    #[must_use]
    pub fn new(host: &dyn PartitionHost, config: FoldersConfig) -> Self {
        assert!(
            host.first_entity().is_none(),
            "entity folders must be created over an empty world"
        );

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut folders = Self {
            entities: Vec::new(),
            folders: Vec::new(),
            selected: None,
            ignore_new_entities: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        };
        let root = folders.create_root(host.active_partition());
        folders.selected = Some(root);
        folders
    }

    // --- Folder table ---

    /// Returns the root folder of a partition.
    #[must_use]
    pub fn root(&self, partition: PartitionHandle) -> Option<FolderId> {
        self.folders
            .iter()
            .filter(|f| f.parent.is_none())
            .inspect(|f| debug_assert!(f.next.is_none() && f.prev.is_none()))
            .find(|f| f.partition == partition)
            .map(|f| f.id)
    }

    /// Creates a folder at the head of `parent`'s child list.
    ///
    /// With `requested == None` a fresh random ID is generated. The folder
    /// inherits the parent's partition.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist or `requested` is already in use.
    pub fn emplace_folder(&mut self, requested: Option<FolderId>, parent: FolderId) -> FolderId {
        let parent_idx = self.require(parent);
        let id = match requested {
            Some(id) => {
                assert!(!self.contains(id), "folder {id} already exists");
                id
            }
            None => self.generate_unique_id(),
        };

        let mut folder = Folder::new(
            id,
            &self.config.default_folder_name,
            self.folders[parent_idx].partition,
        );
        folder.parent = Some(parent);
        folder.next = self.folders[parent_idx].first_child;
        if let Some(first) = folder.next {
            self.folder_mut(first).prev = Some(id);
        }
        self.folders[parent_idx].first_child = Some(id);
        self.folders.push(folder);

        tracing::debug!(folder = %id, parent = %parent, "created folder");
        id
    }

    /// Removes an empty, non-root folder.
    ///
    /// If it was selected, the selection falls back to the first remaining
    /// folder.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist, is a root, or still owns
    /// entities or child folders.
    pub fn destroy_folder(&mut self, id: FolderId) {
        let idx = self.require(id);
        let folder = &self.folders[idx];
        assert!(
            folder.first_entity.is_none(),
            "folder {id} still contains entities"
        );
        assert!(
            folder.first_child.is_none(),
            "folder {id} still contains folders"
        );
        let parent = folder
            .parent
            .unwrap_or_else(|| panic!("root folder {id} cannot be destroyed"));
        let (next, prev) = (folder.next, folder.prev);

        let parent = self.folder_mut(parent);
        if parent.first_child == Some(id) {
            parent.first_child = next;
        }
        if let Some(prev) = prev {
            self.folder_mut(prev).next = next;
        }
        if let Some(next) = next {
            self.folder_mut(next).prev = prev;
        }
        self.folders.remove(idx);

        if self.selected == Some(id) {
            self.selected = self.folders.first().map(|f| f.id);
        }
        tracing::debug!(folder = %id, "destroyed folder");
    }

    /// Removes every folder of a partition, without emptiness checks.
    ///
    /// Used when the whole partition is torn down; its entities are expected
    /// to be gone already.
    pub fn destroy_partition_folders(&mut self, partition: PartitionHandle) {
        let before = self.folders.len();
        self.folders.retain(|f| f.partition != partition);

        if self.selected.is_some_and(|id| !self.contains(id)) {
            self.selected = self.folders.first().map(|f| f.id);
        }
        tracing::debug!(%partition, removed = before - self.folders.len(), "destroyed partition folders");
    }

    /// Selects a folder and activates its partition in the world.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist.
    pub fn select_folder(&mut self, id: FolderId, host: &mut dyn PartitionHost) {
        let partition = self.folders[self.require(id)].partition;
        self.selected = Some(id);
        host.set_active_partition(partition);
    }

    /// The folder new entities are placed in.
    #[must_use]
    pub fn selected_folder(&self) -> Option<FolderId> {
        self.selected
    }

    /// Renames a folder.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist.
    pub fn rename_folder(&mut self, id: FolderId, name: &str) {
        self.folder_mut(id).name = FolderName::new(name);
    }

    /// Moves a partition root and its whole subtree to another partition.
    ///
    /// Member entities are not touched; the world keeps them where they are.
    ///
    /// # Panics
    ///
    /// Panics if `root` is unknown or not a root, or if `partition` already
    /// has a different root.
    pub fn retag_partition(&mut self, root: FolderId, partition: PartitionHandle) {
        self.retag_partitions(&[(root, partition)]);
    }

    /// Moves several root subtrees at once.
    ///
    /// The partitions a batch moves roots into may still hold roots that
    /// the same batch moves away, as happens when loaded partitions are
    /// renumbered.
    ///
    /// # Panics
    ///
    /// Panics if a folder is unknown or not a root, or if two roots would
    /// end up in the same partition.
    pub fn retag_partitions(&mut self, retags: &[(FolderId, PartitionHandle)]) {
        let mut subtrees = Vec::with_capacity(retags.len());
        for &(root, partition) in retags {
            let idx = self.require(root);
            assert!(self.folders[idx].parent.is_none(), "folder {root} is not a root");
            subtrees.push((self.subtree(root), partition));
        }
        for (ids, partition) in subtrees {
            for id in ids {
                self.folder_mut(id).partition = partition;
            }
        }

        let mut seen = HashSet::new();
        for root in self.folders.iter().filter(|f| f.parent.is_none()) {
            assert!(
                seen.insert(root.partition),
                "{} already has a root folder",
                root.partition
            );
        }
    }

    /// Creates a root folder for `partition` unless it already has one.
    pub fn ensure_root(&mut self, partition: PartitionHandle) -> FolderId {
        match self.root(partition) {
            Some(root) => root,
            None => self.create_root(partition),
        }
    }

    /// The configuration the manager was created with.
    #[must_use]
    pub fn config(&self) -> &FoldersConfig {
        &self.config
    }

    /// Looks up a folder.
    #[must_use]
    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// All folders, in creation order.
    #[must_use]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Checks if a folder exists.
    #[must_use]
    pub fn contains(&self, id: FolderId) -> bool {
        self.folder(id).is_some()
    }

    /// Number of folders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Returns true if there are no folders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Iterates over the children of a folder, most recently created first.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist.
    #[must_use]
    pub fn children(&self, id: FolderId) -> Children<'_> {
        Children {
            folders: self,
            current: self.folders[self.require(id)].first_child,
        }
    }

    // --- Entity index ---

    /// Moves an entity to the head of `folder`'s member list.
    ///
    /// If the entity changes partition in the process, the world is asked to
    /// move it as well.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist.
    pub fn move_to_folder(
        &mut self,
        entity: EntityRef,
        folder: FolderId,
        host: &mut dyn PartitionHost,
    ) {
        let dst_idx = self.require(folder);
        self.ensure_slot(entity);

        let dst_partition = self.folders[dst_idx].partition;
        if let Some(src) = self.entities[entity.slot()].folder {
            let src_partition = self.folder(src).map(|f| f.partition);
            self.unlink(entity);
            if src_partition != Some(dst_partition) {
                host.set_partition(entity, dst_partition);
            }
        }
        self.attach(entity, dst_idx);
    }

    /// Places a newly created entity in the selected folder.
    ///
    /// Does nothing while new entities are being ignored.
    pub fn on_entity_created(&mut self, entity: EntityRef, host: &mut dyn PartitionHost) {
        if self.ignore_new_entities {
            return;
        }
        match self.selected {
            Some(folder) => self.move_to_folder(entity, folder, host),
            None => tracing::warn!(%entity, "no folder selected; entity left untracked"),
        }
    }

    /// Removes a destroyed entity from its folder.
    ///
    /// The slot is kept; untracked entities are ignored.
    pub fn on_entity_destroyed(&mut self, entity: EntityRef) {
        if entity.slot() < self.entities.len() {
            self.unlink(entity);
        }
    }

    /// Suppresses or restores auto-placement of created entities.
    pub fn set_ignore_new_entities(&mut self, ignore: bool) {
        self.ignore_new_entities = ignore;
    }

    /// Returns true while created entities are not auto-placed.
    #[must_use]
    pub fn ignores_new_entities(&self) -> bool {
        self.ignore_new_entities
    }

    /// The folder owning an entity.
    #[must_use]
    pub fn folder_of(&self, entity: EntityRef) -> Option<FolderId> {
        self.link(entity).and_then(|l| l.folder)
    }

    /// The next entity in the same folder.
    #[must_use]
    pub fn next_entity(&self, entity: EntityRef) -> Option<EntityRef> {
        self.link(entity).and_then(|l| l.next)
    }

    /// The previous entity in the same folder.
    #[must_use]
    pub fn prev_entity(&self, entity: EntityRef) -> Option<EntityRef> {
        self.link(entity).and_then(|l| l.prev)
    }

    /// The linkage record of an entity slot, if the index has grown that far.
    #[must_use]
    pub fn link(&self, entity: EntityRef) -> Option<&EntityLink> {
        self.entities.get(entity.slot())
    }

    /// Number of entity slots tracked.
    #[must_use]
    pub fn entity_capacity(&self) -> usize {
        self.entities.len()
    }

    /// Iterates over the members of a folder, most recently added first.
    ///
    /// # Panics
    ///
    /// Panics if the folder does not exist.
    #[must_use]
    pub fn entities(&self, id: FolderId) -> FolderEntities<'_> {
        FolderEntities {
            links: &self.entities,
            current: self.folders[self.require(id)].first_entity,
        }
    }

    // --- Integrity ---

    /// Checks every structural invariant of the forest and the member lists.
    ///
    /// # Errors
    ///
    /// Returns an `Integrity` error describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.folders.len());
        for f in &self.folders {
            if !ids.insert(f.id) {
                return Err(Error::integrity(format!("duplicate folder {}", f.id)));
            }
        }

        let mut roots = HashSet::new();
        let mut listed_children = 0;
        for f in &self.folders {
            match f.parent {
                None => {
                    if !roots.insert(f.partition) {
                        return Err(Error::integrity(format!("{} has two roots", f.partition)));
                    }
                    if f.next.is_some() || f.prev.is_some() {
                        return Err(Error::integrity(format!("root {} has siblings", f.id)));
                    }
                }
                Some(parent) if !ids.contains(&parent) => {
                    return Err(Error::integrity(format!(
                        "folder {} has missing parent {parent}",
                        f.id
                    )));
                }
                Some(_) => {}
            }
            listed_children += self.validate_children(f)?;
            self.validate_ancestry(f)?;
        }
        if listed_children != self.folders.len() - roots.len() {
            return Err(Error::integrity("folder missing from its parent's child list"));
        }

        let mut listed_entities = 0;
        for f in &self.folders {
            listed_entities += self.validate_members(f)?;
        }
        let tracked = self.entities.iter().filter(|l| l.folder.is_some()).count();
        if listed_entities != tracked {
            return Err(Error::integrity(format!(
                "{tracked} tracked entities but {listed_entities} listed in folders"
            )));
        }
        Ok(())
    }

    fn validate_children(&self, folder: &Folder) -> Result<usize> {
        let mut prev = None;
        let mut cursor = folder.first_child;
        let mut count = 0;
        while let Some(id) = cursor {
            let child = self
                .folder(id)
                .ok_or_else(|| Error::integrity(format!("folder {} lists missing child {id}", folder.id)))?;
            if child.parent != Some(folder.id) || child.prev != prev {
                return Err(Error::integrity(format!("child {id} of {} is mislinked", folder.id)));
            }
            count += 1;
            if count > self.folders.len() {
                return Err(Error::integrity(format!("child list of {} loops", folder.id)));
            }
            prev = cursor;
            cursor = child.next;
        }
        Ok(count)
    }

    fn validate_ancestry(&self, folder: &Folder) -> Result<()> {
        let mut cursor = folder.parent;
        for _ in 0..self.folders.len() {
            match cursor.and_then(|id| self.folder(id)) {
                Some(ancestor) => cursor = ancestor.parent,
                None => return Ok(()),
            }
        }
        Err(Error::integrity(format!("folder {} is part of a cycle", folder.id)))
    }

    fn validate_members(&self, folder: &Folder) -> Result<usize> {
        let mut prev = None;
        let mut cursor = folder.first_entity;
        let mut count = 0;
        while let Some(e) = cursor {
            let link = self
                .link(e)
                .ok_or_else(|| Error::integrity(format!("folder {} lists unknown {e}", folder.id)))?;
            if link.folder != Some(folder.id) || link.prev != prev {
                return Err(Error::integrity(format!("{e} in folder {} is mislinked", folder.id)));
            }
            count += 1;
            if count > self.entities.len() {
                return Err(Error::integrity(format!("member list of {} loops", folder.id)));
            }
            prev = cursor;
            cursor = link.next;
        }
        Ok(count)
    }

    // --- Internals ---

    pub(crate) fn create_root(&mut self, partition: PartitionHandle) -> FolderId {
        let id = self.generate_unique_id();
        let root = Folder::new(id, &self.config.root_name, partition);
        self.folders.push(root);
        tracing::debug!(folder = %id, %partition, "created root folder");
        id
    }

    /// Draws random IDs until one is unused.
    pub(crate) fn generate_unique_id(&mut self) -> FolderId {
        self.generate_id_avoiding(&HashSet::new())
    }

    /// Draws random IDs until one is neither in use nor `reserved`.
    pub(crate) fn generate_id_avoiding(&mut self, reserved: &HashSet<FolderId>) -> FolderId {
        loop {
            if let Some(id) = FolderId::new(self.rng.next_u64()) {
                if !self.contains(id) && !reserved.contains(&id) {
                    return id;
                }
            }
        }
    }

    /// IDs of `root` and all its descendants.
    ///
    /// Tolerates dangling or cyclic links, so it can run over freshly
    /// loaded data.
    fn subtree(&self, root: FolderId) -> Vec<FolderId> {
        let mut ids = Vec::new();
        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(folder) = self.folder(id) else {
                continue;
            };
            ids.push(id);
            let mut child = folder.first_child;
            while let Some(c) = child.filter(|c| seen.insert(*c)) {
                stack.push(c);
                child = self.folder(c).and_then(|f| f.next);
            }
        }
        ids
    }

    fn index_of(&self, id: FolderId) -> Option<usize> {
        self.folders.iter().position(|f| f.id == id)
    }

    fn require(&self, id: FolderId) -> usize {
        self.index_of(id)
            .unwrap_or_else(|| panic!("unknown folder {id}"))
    }

    fn folder_mut(&mut self, id: FolderId) -> &mut Folder {
        let idx = self.require(id);
        &mut self.folders[idx]
    }

    pub(crate) fn ensure_slot(&mut self, entity: EntityRef) {
        if self.entities.len() <= entity.slot() {
            self.entities.resize(entity.slot() + 1, EntityLink::default());
        }
    }

    /// Inserts a detached entity at the head of a folder's member list.
    pub(crate) fn attach(&mut self, entity: EntityRef, folder_idx: usize) {
        let folder = &mut self.folders[folder_idx];
        let head = folder.first_entity;
        folder.first_entity = Some(entity);
        self.entities[entity.slot()] = EntityLink {
            folder: Some(folder.id),
            next: head,
            prev: None,
        };
        if let Some(head) = head {
            self.entities[head.slot()].prev = Some(entity);
        }
    }

    /// Removes an entity from its member list and resets its record.
    pub(crate) fn unlink(&mut self, entity: EntityRef) {
        let link = self.entities[entity.slot()];
        let Some(folder) = link.folder else {
            return;
        };
        if let Some(idx) = self.index_of(folder) {
            let folder = &mut self.folders[idx];
            if folder.first_entity == Some(entity) {
                folder.first_entity = link.next;
            }
        }
        if let Some(prev) = link.prev {
            self.entities[prev.slot()].next = link.next;
        }
        if let Some(next) = link.next {
            self.entities[next.slot()].prev = link.prev;
        }
        self.entities[entity.slot()] = EntityLink::default();
    }

    /// Re-selects a folder if the selection no longer exists.
    pub(crate) fn repair_selection(&mut self, active: PartitionHandle) {
        if self.selected.is_some_and(|id| self.contains(id)) {
            return;
        }
        self.selected = self
            .root(active)
            .or_else(|| self.folders.first().map(|f| f.id));
    }
}

/// Iterator over the children of a folder.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    folders: &'a EntityFolders,
    current: Option<FolderId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a Folder;

    fn next(&mut self) -> Option<Self::Item> {
        let folder = self.folders.folder(self.current?)?;
        self.current = folder.next;
        Some(folder)
    }
}

/// Iterator over the member entities of a folder.
#[derive(Debug, Clone)]
pub struct FolderEntities<'a> {
    links: &'a [EntityLink],
    current: Option<EntityRef>,
}

impl Iterator for FolderEntities<'_> {
    type Item = EntityRef;

    fn next(&mut self) -> Option<Self::Item> {
        let entity = self.current?;
        self.current = self.links.get(entity.slot()).and_then(|l| l.next);
        Some(entity)
    }
}
