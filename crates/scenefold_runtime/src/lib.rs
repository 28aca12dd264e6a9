//! Scene binding and scene files for scenefold.
//!
//! This crate provides:
//! - [`Scene`] - A world whose entity lifecycle drives its folder hierarchy
//! - Scene file serialization and additive loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod scene;
pub mod serialize;

pub use scene::Scene;
pub use serialize::{AdditiveLoad, from_bytes, load_from_file, save_to_file, to_bytes};
