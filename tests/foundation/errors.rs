//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use scenefold_foundation::{EntityRef, Error, ErrorContext, ErrorKind, PartitionHandle};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_entity_not_found() {
    let err = Error::entity_not_found(EntityRef::new(42));
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
    assert!(format!("{err}").contains("42"));
}

#[test]
fn error_unknown_partition() {
    let err = Error::unknown_partition(PartitionHandle(3));
    assert!(matches!(err.kind, ErrorKind::UnknownPartition(PartitionHandle(3))));
    assert!(format!("{err}").contains("Partition(3)"));
}

#[test]
fn error_invalid_length() {
    let err = Error::invalid_length("folder", -5);
    let msg = format!("{err}");
    assert!(msg.contains("folder"));
    assert!(msg.contains("-5"));
}

#[test]
fn error_invalid_entity_pointer() {
    let err = Error::invalid_entity_pointer(-7);
    assert!(matches!(err.kind, ErrorKind::InvalidEntityPointer(-7)));
}

#[test]
fn error_integrity() {
    let err = Error::integrity("cycle");
    assert_eq!(format!("{err}"), "integrity violation: cycle");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_with_context() {
    let err = Error::unexpected_eof(4, 1)
        .with_context(ErrorContext::new().with_section("folders").with_offset(12));

    let context = err.context.unwrap();
    assert_eq!(context.to_string(), "in folders at byte 12");
}

#[test]
fn context_with_offset_only() {
    let context = ErrorContext::new().with_offset(3);
    assert_eq!(context.to_string(), "at byte 3");
}
