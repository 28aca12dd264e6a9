//! Entity lifecycle management with dense, reusable indices.
//!
//! The `EntityStore` hands out slot indices and remembers which partition
//! each live entity belongs to. Destroyed slots go on a free list and are
//! handed out again, so indices stay dense.

// Allow usize to u32 casts - entity indices are bounded by EntityRef::MAX_INDEX
#![allow(clippy::cast_possible_truncation)]

use scenefold_foundation::{EntityRef, Error, PartitionHandle, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Manages entity slots and their partition assignment.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityStore {
    /// Partition per slot; `None` for a free slot.
    slots: Vec<Option<PartitionHandle>>,
    /// Free list of indices available for reuse.
    free_list: Vec<u32>,
    /// Count of live entities.
    live_count: usize,
}

impl EntityStore {
    /// Creates a new empty entity store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new entity in `partition`, returns its reference.
    ///
    /// Reuses indices from the free list when available.
    pub fn spawn(&mut self, partition: PartitionHandle) -> EntityRef {
        self.live_count += 1;

        if let Some(index) = self.free_list.pop() {
            self.slots[index as usize] = Some(partition);
            EntityRef::new(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(partition));
            EntityRef::new(index)
        }
    }

    /// Destroys an entity.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not alive.
    pub fn destroy(&mut self, id: EntityRef) -> Result<PartitionHandle> {
        let partition = self
            .slots
            .get_mut(id.slot())
            .and_then(Option::take)
            .ok_or_else(|| Error::entity_not_found(id))?;

        self.free_list.push(id.index);
        self.live_count -= 1;
        Ok(partition)
    }

    /// Checks if an entity is alive.
    #[must_use]
    pub fn exists(&self, id: EntityRef) -> bool {
        self.partition_of(id).is_some()
    }

    /// Returns the partition of a live entity.
    #[must_use]
    pub fn partition_of(&self, id: EntityRef) -> Option<PartitionHandle> {
        self.slots.get(id.slot()).copied().flatten()
    }

    /// Moves a live entity to another partition.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not alive.
    pub fn set_partition(&mut self, id: EntityRef, partition: PartitionHandle) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id.slot())
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::entity_not_found(id))?;
        *slot = partition;
        Ok(())
    }

    /// Returns the total number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of slots ever allocated, live or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over all live entities in index order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| EntityRef::new(idx as u32))
    }

    /// Iterates over the live entities of one partition.
    pub fn iter_partition(&self, partition: PartitionHandle) -> impl Iterator<Item = EntityRef> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, slot)| **slot == Some(partition))
            .map(|(idx, _)| EntityRef::new(idx as u32))
    }
}
