use crate::entity::EntityRef;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Maps a stable domain key to the one ACTIVE entity representing it.
///
/// Invariants:
/// - at most one entry per key (last write wins)
/// - at most one key per entity reference
pub struct IdentityIndex<K> {
    /// Primary map: key -> entity
    by_key: HashMap<K, EntityRef>,

    /// Reverse map for O(1) removal by entity
    by_ref: HashMap<EntityRef, K>,
}

impl<K: Eq + Hash + Clone> IdentityIndex<K> {
    pub fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            by_ref: HashMap::new(),
        }
    }

    /// Point `key` at `entity`, replacing whatever it pointed at before
    pub fn upsert(&mut self, key: K, entity: EntityRef) {
        // Entity re-keyed: its old key no longer resolves
        if let Some(previous_key) = self.by_ref.insert(entity, key.clone()) {
            if previous_key != key {
                self.by_key.remove(&previous_key);
            }
        }

        // Key re-pointed: the displaced entity loses its entry
        if let Some(displaced) = self.by_key.insert(key, entity) {
            if displaced != entity {
                self.by_ref.remove(&displaced);
            }
        }
    }

    /// Drop the entry pointing at exactly `entity`, returning its key
    pub fn remove(&mut self, entity: EntityRef) -> Option<K> {
        let key = self.by_ref.remove(&entity)?;
        self.by_key.remove(&key);
        Some(key)
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<EntityRef>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.by_key.get(key).copied()
    }

    /// Key currently owned by `entity`, if any
    pub fn key_of(&self, entity: EntityRef) -> Option<&K> {
        self.by_ref.get(&entity)
    }

    pub fn contains_ref(&self, entity: EntityRef) -> bool {
        self.by_ref.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for IdentityIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
