//! Folder and entity linkage records.

use std::fmt;

use scenefold_foundation::{EntityRef, FolderId, PartitionHandle};

/// Longest folder name, in bytes.
pub const MAX_FOLDER_NAME_LEN: usize = 63;

/// A folder name, at most [`MAX_FOLDER_NAME_LEN`] bytes of UTF-8.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FolderName(String);

impl FolderName {
    /// Creates a name, truncating on a character boundary if too long.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(MAX_FOLDER_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Self(name[..end].to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node of the folder forest.
///
/// Siblings form a doubly-linked list headed by the parent's `first_child`.
/// Member entities form a doubly-linked list headed by `first_entity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Folder {
    pub(crate) id: FolderId,
    pub(crate) parent: Option<FolderId>,
    pub(crate) next: Option<FolderId>,
    pub(crate) prev: Option<FolderId>,
    pub(crate) first_child: Option<FolderId>,
    pub(crate) first_entity: Option<EntityRef>,
    pub(crate) partition: PartitionHandle,
    pub(crate) name: FolderName,
}

impl Folder {
    pub(crate) fn new(id: FolderId, name: &str, partition: PartitionHandle) -> Self {
        Self {
            id,
            parent: None,
            next: None,
            prev: None,
            first_child: None,
            first_entity: None,
            partition,
            name: FolderName::new(name),
        }
    }

    /// The folder's ID.
    #[must_use]
    pub fn id(&self) -> FolderId {
        self.id
    }

    /// Parent folder; `None` for a partition root.
    #[must_use]
    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    /// Next sibling.
    #[must_use]
    pub fn next(&self) -> Option<FolderId> {
        self.next
    }

    /// Previous sibling.
    #[must_use]
    pub fn prev(&self) -> Option<FolderId> {
        self.prev
    }

    /// Head of the child list.
    #[must_use]
    pub fn first_child(&self) -> Option<FolderId> {
        self.first_child
    }

    /// Head of the member entity list.
    #[must_use]
    pub fn first_entity(&self) -> Option<EntityRef> {
        self.first_entity
    }

    /// Partition the folder belongs to.
    #[must_use]
    pub fn partition(&self) -> PartitionHandle {
        self.partition
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns true if this is a partition root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns true if the folder has neither entities nor children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_entity.is_none() && self.first_child.is_none()
    }
}

/// Per-entity folder membership.
///
/// A default record means the entity is not tracked by any folder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityLink {
    pub(crate) folder: Option<FolderId>,
    pub(crate) next: Option<EntityRef>,
    pub(crate) prev: Option<EntityRef>,
}

impl EntityLink {
    /// Folder owning the entity.
    #[must_use]
    pub fn folder(&self) -> Option<FolderId> {
        self.folder
    }

    /// Next entity in the same folder.
    #[must_use]
    pub fn next(&self) -> Option<EntityRef> {
        self.next
    }

    /// Previous entity in the same folder.
    #[must_use]
    pub fn prev(&self) -> Option<EntityRef> {
        self.prev
    }
}
