//! The part of a world that folder operations may touch.

use scenefold_foundation::{EntityRef, PartitionHandle};

/// Partition control exposed to the folder manager.
///
/// Entity creation and destruction are deliberately absent: lifecycle
/// handlers run while the world is in the middle of creating or destroying
/// an entity, and must not start another lifecycle change.
pub trait PartitionHost {
    /// Lowest live entity, or `None` for an empty world.
    fn first_entity(&self) -> Option<EntityRef>;

    /// Moves a live entity into `partition`.
    fn set_partition(&mut self, entity: EntityRef, partition: PartitionHandle);

    /// The partition new entities are created in.
    fn active_partition(&self) -> PartitionHandle;

    /// Makes `partition` the active one.
    fn set_active_partition(&mut self, partition: PartitionHandle);
}
