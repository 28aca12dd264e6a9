//! Versions of the editor scene format.
//!
//! The version travels in the scene file header, next to the blobs it
//! describes, and decides how those blobs are decoded.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Editor scene format version.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u32)]
pub enum FormatVersion {
    /// First versioned format.
    Initial = 0,
    /// Prefab instances stored alongside entities.
    Prefabs = 1,
    /// Last format with the flat folder table.
    LegacyFolders = 2,
    /// Folder tree with intrusive entity lists.
    FolderTree = 3,
    /// Folders tagged with partitions.
    Partitions = 4,
}

impl FormatVersion {
    /// Version written by this build.
    pub const LATEST: Self = Self::Partitions;

    /// Returns true if folder data in this version predates the folder tree
    /// and cannot be read structurally.
    #[must_use]
    pub fn has_legacy_folders(self) -> bool {
        self <= Self::LegacyFolders
    }

    /// Returns the raw value written to headers.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for FormatVersion {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Initial),
            1 => Ok(Self::Prefabs),
            2 => Ok(Self::LegacyFolders),
            3 => Ok(Self::FolderTree),
            4 => Ok(Self::Partitions),
            other => Err(Error::new(ErrorKind::UnknownVersion(other))),
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u32())
    }
}
