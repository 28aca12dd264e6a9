//! Integration tests for Layer 1: Storage
//!
//! Tests for entity slots, partitions, and the partition host surface.

mod partitions;
