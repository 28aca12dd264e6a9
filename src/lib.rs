//! Scenefold - Entity folder hierarchy for partitioned scene editing
//!
//! This crate re-exports all layers of the Scenefold system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: scenefold_runtime    Scene binding, scene files
//! Layer 2: scenefold_folders    Folder tree, entity membership, binary codec
//! Layer 1: scenefold_storage    Entity slots, partitions, PartitionHost
//! Layer 0: scenefold_foundation Core types (EntityRef, FolderId, Error, blobs)
//! ```

pub use scenefold_folders as folders;
pub use scenefold_foundation as foundation;
pub use scenefold_runtime as runtime;
pub use scenefold_storage as storage;
