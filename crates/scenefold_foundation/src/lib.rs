//! Core identifiers, entity maps, binary blobs, and errors for scenefold.
//!
//! This crate provides:
//! - [`EntityRef`] - Dense entity index handles
//! - [`FolderId`] - Non-zero random folder identifiers
//! - [`PartitionHandle`] - Opaque sub-scene handles
//! - [`EntityMap`] - Source-to-destination entity remapping for loads and clones
//! - [`OutputBlob`] / [`InputBlob`] - Binary streams with checked reads
//! - [`FormatVersion`] - Versions of the editor scene format
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod blob;
pub mod entity_map;
pub mod error;
pub mod ids;
pub mod version;

pub use blob::{InputBlob, OutputBlob};
pub use entity_map::EntityMap;
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use ids::{EntityRef, FolderId, PartitionHandle};
pub use version::FormatVersion;
