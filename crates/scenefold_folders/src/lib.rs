//! Entity folder hierarchy for scenefold.
//!
//! Folders form a forest with one root per partition. Every folder also
//! heads an intrusive, doubly-linked list of the entities it owns; the links
//! live in a dense array indexed by entity slot, so inserting, removing, and
//! moving an entity is O(1) regardless of folder size.
//!
//! This crate provides:
//! - [`EntityFolders`] - The folder table, entity index, and selection
//! - [`Folder`] / [`EntityLink`] - The records both are made of
//! - [`FoldersConfig`] - Names and ID seeding
//!
//! The manager never owns the world. Operations that must observe or change
//! partitions take a [`PartitionHost`](scenefold_storage::PartitionHost).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod config;
pub mod folder;
pub mod folders;

pub use codec::{ENTITY_RECORD_SIZE, FOLDER_RECORD_SIZE, LoadSummary};
pub use config::FoldersConfig;
pub use folder::{EntityLink, Folder, FolderName, MAX_FOLDER_NAME_LEN};
pub use folders::{Children, EntityFolders, FolderEntities};
