//! Host world for scenefold: entity slots, partitions, and the partition
//! control surface the folder manager drives.
//!
//! This crate provides:
//! - [`EntityStore`] - Dense entity slots with index reuse
//! - [`World`] - Entities grouped into named partitions, one of them active
//! - [`PartitionHost`] - The narrow view of a world handed to folder operations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod host;
pub mod world;

pub use entity::EntityStore;
pub use host::PartitionHost;
pub use world::{Partition, World};
