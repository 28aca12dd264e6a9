//! Error types for the scenefold system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Only recoverable conditions are errors: malformed or truncated data,
//! unknown versions, I/O. Structural misuse of the folder manager (unknown
//! folders, destroying non-empty folders) is a caller bug and panics.

use std::fmt;

use thiserror::Error;

use crate::ids::{EntityRef, PartitionHandle};

/// Result type used throughout scenefold.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for scenefold operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityRef) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates an unknown partition error.
    #[must_use]
    pub fn unknown_partition(partition: PartitionHandle) -> Self {
        Self::new(ErrorKind::UnknownPartition(partition))
    }

    /// Creates a truncated stream error.
    #[must_use]
    pub fn unexpected_eof(needed: usize, remaining: usize) -> Self {
        Self::new(ErrorKind::UnexpectedEof { needed, remaining })
    }

    /// Creates an invalid element count error.
    #[must_use]
    pub fn invalid_length(what: &'static str, count: i64) -> Self {
        Self::new(ErrorKind::InvalidLength { what, count })
    }

    /// Creates an invalid serialized entity pointer error.
    #[must_use]
    pub fn invalid_entity_pointer(raw: i32) -> Self {
        Self::new(ErrorKind::InvalidEntityPointer(raw))
    }

    /// Creates a structural integrity error.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Integrity(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Entity was not found in the world.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityRef),

    /// Partition does not exist.
    #[error("unknown partition: {0}")]
    UnknownPartition(PartitionHandle),

    /// Partition still owns entities.
    #[error("{partition} still holds {entities} entities")]
    PartitionNotEmpty {
        /// The partition that was targeted.
        partition: PartitionHandle,
        /// Number of entities still assigned to it.
        entities: usize,
    },

    /// The input stream ended early.
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// A serialized element count is negative or larger than the stream.
    #[error("invalid {what} count: {count}")]
    InvalidLength {
        /// What was being counted.
        what: &'static str,
        /// The count found in the stream.
        count: i64,
    },

    /// A serialized entity pointer is negative but not the null marker, or
    /// refers to an entity past the end of the entity records.
    #[error("invalid entity pointer: {0}")]
    InvalidEntityPointer(i32),

    /// A serialized folder record has a zero ID.
    #[error("folder record without an id")]
    MissingFolderId,

    /// A serialized folder name is not valid UTF-8.
    #[error("folder name is not valid utf-8")]
    InvalidFolderName,

    /// The scene format version is not known.
    #[error("unknown format version: {0}")]
    UnknownVersion(u32),

    /// The file does not start with the scene file magic.
    #[error("not a scene file")]
    BadMagic,

    /// The folder structure violates one of its invariants.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Filesystem operation failed.
    #[error("io error: {0}")]
    IoError(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the section being decoded.
    pub section: Option<String>,
    /// Byte offset into the stream.
    pub offset: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the section name.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Sets the byte offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(section) = &self.section {
            write!(f, "in {section}")?;
        }
        if let Some(offset) = self.offset {
            if self.section.is_some() {
                write!(f, " ")?;
            }
            write!(f, "at byte {offset}")?;
        }
        Ok(())
    }
}
