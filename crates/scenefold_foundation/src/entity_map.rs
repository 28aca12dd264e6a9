//! Translation of entity references across load and clone boundaries.
//!
//! When a saved sub-scene is merged into a running world, or a partition is
//! cloned into a fresh one, entity indices change. An [`EntityMap`] records
//! where each source entity ended up. Source entities that were not carried
//! over are simply absent; looking them up yields `None` and callers drop
//! them on purpose.

use crate::ids::EntityRef;

/// Dense map from source entity to destination entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMap {
    /// Destination per source index.
    slots: Vec<Option<EntityRef>>,
    /// Number of mapped entries.
    len: usize,
}

impl EntityMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map sending each of the first `count` entities to itself.
    #[must_use]
    pub fn identity(count: u32) -> Self {
        (0..count)
            .map(|i| (EntityRef::new(i), EntityRef::new(i)))
            .collect()
    }

    /// Records that `src` became `dst`, replacing any earlier mapping.
    pub fn insert(&mut self, src: EntityRef, dst: EntityRef) {
        if self.slots.len() <= src.slot() {
            self.slots.resize(src.slot() + 1, None);
        }
        if self.slots[src.slot()].replace(dst).is_none() {
            self.len += 1;
        }
    }

    /// Removes the mapping for `src`, returning its destination.
    pub fn remove(&mut self, src: EntityRef) -> Option<EntityRef> {
        let removed = self.slots.get_mut(src.slot()).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Returns the destination of `src`, if it was carried over.
    #[must_use]
    pub fn get(&self, src: EntityRef) -> Option<EntityRef> {
        self.slots.get(src.slot()).copied().flatten()
    }

    /// Maps an entity pointer. Null and unmapped pointers both map to null.
    #[must_use]
    pub fn map_ptr(&self, src: Option<EntityRef>) -> Option<EntityRef> {
        src.and_then(|e| self.get(e))
    }

    /// Number of mapped entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates `(source, destination)` pairs in source-index order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (EntityRef, EntityRef)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, dst)| dst.map(|dst| (EntityRef::new(i as u32), dst)))
    }

    /// Largest destination index in the map.
    #[must_use]
    pub fn max_destination(&self) -> Option<EntityRef> {
        self.iter().map(|(_, dst)| dst).max()
    }
}

impl FromIterator<(EntityRef, EntityRef)> for EntityMap {
    fn from_iter<I: IntoIterator<Item = (EntityRef, EntityRef)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (src, dst) in iter {
            map.insert(src, dst);
        }
        map
    }
}
