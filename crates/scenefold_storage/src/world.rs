//! World state: entities grouped into partitions.
//!
//! A partition is an independently loadable sub-scene. Every entity lives in
//! exactly one partition, and exactly one partition is active at a time; new
//! entities are created in the active one.

use scenefold_foundation::{EntityRef, Error, ErrorKind, PartitionHandle, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::EntityStore;
use crate::host::PartitionHost;

/// A named partition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Partition {
    /// Handle of the partition.
    pub handle: PartitionHandle,
    /// Display name.
    pub name: String,
}

/// Entities and partitions of one scene.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct World {
    /// Entity lifecycle management.
    entities: EntityStore,
    /// Known partitions, in creation order.
    partitions: Vec<Partition>,
    /// Partition new entities are created in.
    active: PartitionHandle,
    /// Next handle to hand out.
    next_partition: u16,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with a single, active default partition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: EntityStore::new(),
            partitions: vec![Partition {
                handle: PartitionHandle::DEFAULT,
                name: "default".to_string(),
            }],
            active: PartitionHandle::DEFAULT,
            next_partition: 1,
        }
    }

    // --- Entities ---

    /// Creates an entity in the active partition.
    pub fn create_entity(&mut self) -> EntityRef {
        self.entities.spawn(self.active)
    }

    /// Destroys an entity, returning the partition it lived in.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not alive.
    pub fn destroy_entity(&mut self, entity: EntityRef) -> Result<PartitionHandle> {
        self.entities.destroy(entity)
    }

    /// Checks if an entity is alive.
    #[must_use]
    pub fn exists(&self, entity: EntityRef) -> bool {
        self.entities.exists(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates over all live entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.entities.iter()
    }

    /// Iterates over the live entities of one partition.
    pub fn partition_entities(
        &self,
        partition: PartitionHandle,
    ) -> impl Iterator<Item = EntityRef> + '_ {
        self.entities.iter_partition(partition)
    }

    /// Returns the partition of a live entity.
    #[must_use]
    pub fn partition_of(&self, entity: EntityRef) -> Option<PartitionHandle> {
        self.entities.partition_of(entity)
    }

    // --- Partitions ---

    /// Creates a new, empty partition.
    ///
    /// # Panics
    ///
    /// Panics if all partition handles are in use.
    pub fn create_partition(&mut self, name: impl Into<String>) -> PartitionHandle {
        let handle = PartitionHandle(self.next_partition);
        self.next_partition = self
            .next_partition
            .checked_add(1)
            .unwrap_or_else(|| panic!("partition handles exhausted"));
        let name = name.into();
        tracing::debug!(%handle, %name, "created partition");
        self.partitions.push(Partition { handle, name });
        handle
    }

    /// Removes an empty partition.
    ///
    /// If it was active, the first remaining partition becomes active.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is unknown, still holds entities,
    /// or is the last partition.
    pub fn destroy_partition(&mut self, partition: PartitionHandle) -> Result<()> {
        if !self.has_partition(partition) {
            return Err(Error::unknown_partition(partition));
        }
        let entities = self.entities.iter_partition(partition).count();
        if entities > 0 {
            return Err(Error::new(ErrorKind::PartitionNotEmpty {
                partition,
                entities,
            }));
        }
        if self.partitions.len() == 1 {
            return Err(Error::integrity("cannot destroy the last partition"));
        }

        self.partitions.retain(|p| p.handle != partition);
        if self.active == partition {
            self.active = self.partitions[0].handle;
        }
        tracing::debug!(%partition, "destroyed partition");
        Ok(())
    }

    /// Checks if a partition exists.
    #[must_use]
    pub fn has_partition(&self, partition: PartitionHandle) -> bool {
        self.partitions.iter().any(|p| p.handle == partition)
    }

    /// Returns all partitions in creation order.
    #[must_use]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Returns the display name of a partition.
    #[must_use]
    pub fn partition_name(&self, partition: PartitionHandle) -> Option<&str> {
        self.partitions
            .iter()
            .find(|p| p.handle == partition)
            .map(|p| p.name.as_str())
    }
}

impl PartitionHost for World {
    fn first_entity(&self) -> Option<EntityRef> {
        self.entities.iter().next()
    }

    fn set_partition(&mut self, entity: EntityRef, partition: PartitionHandle) {
        assert!(self.has_partition(partition), "unknown {partition}");
        if let Err(err) = self.entities.set_partition(entity, partition) {
            panic!("cannot move entity to {partition}: {err}");
        }
    }

    fn active_partition(&self) -> PartitionHandle {
        self.active
    }

    fn set_active_partition(&mut self, partition: PartitionHandle) {
        assert!(self.has_partition(partition), "unknown {partition}");
        self.active = partition;
    }
}
