//! Identifiers for entities, folders, and partitions.
//!
//! Missing references are modelled as `Option`: `Option<EntityRef>` is an
//! entity pointer and `Option<FolderId>` a folder reference. The binary format
//! still uses sentinels (`-1` for entities, `0` for folders), so this module
//! also owns the conversion between the two.

use std::fmt;
use std::num::NonZeroU64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dense index handle for an entity slot.
///
/// Indices are 0-based and only ever grow; a slot may be empty when its
/// entity was destroyed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityRef {
    /// Index into entity storage.
    pub index: u32,
}

impl EntityRef {
    /// Largest index an entity may have. Serialized pointers are signed.
    pub const MAX_INDEX: u32 = i32::MAX as u32;

    /// Creates an entity reference for the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`EntityRef::MAX_INDEX`].
    #[must_use]
    pub const fn new(index: u32) -> Self {
        assert!(index <= Self::MAX_INDEX, "entity index out of range");
        Self { index }
    }

    /// Returns the index as a `usize`, for addressing dense arrays.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.index as usize
    }

    /// Encodes an entity pointer, `None` becoming `-1`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn encode_ptr(ptr: Option<Self>) -> i32 {
        match ptr {
            Some(e) => e.index as i32,
            None => -1,
        }
    }

    /// Decodes an entity pointer written by [`EntityRef::encode_ptr`].
    ///
    /// # Errors
    ///
    /// Returns an error for negative values other than `-1`.
    #[allow(clippy::cast_sign_loss)]
    pub fn decode_ptr(raw: i32) -> Result<Option<Self>> {
        match raw {
            -1 => Ok(None),
            i if i >= 0 => Ok(Some(Self { index: i as u32 })),
            i => Err(Error::invalid_entity_pointer(i)),
        }
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.index)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.index)
    }
}

/// Process-unique identifier of a folder.
///
/// Generated randomly and stable across save/load. Zero is reserved as the
/// on-disk "no folder" value and can never be a valid ID.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FolderId(NonZeroU64);

impl FolderId {
    /// Creates a folder ID, returning `None` for zero.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Returns the raw 64-bit value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Encodes a folder reference, `None` becoming `0`.
    #[must_use]
    pub const fn encode(id: Option<Self>) -> u64 {
        match id {
            Some(id) => id.get(),
            None => 0,
        }
    }
}

impl fmt::Debug for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FolderId({:#018x})", self.get())
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.get())
    }
}

/// Opaque handle of an independently loadable sub-scene.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionHandle(pub u16);

impl PartitionHandle {
    /// The partition every world starts with.
    pub const DEFAULT: Self = Self(0);
}

impl fmt::Display for PartitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition({})", self.0)
    }
}
