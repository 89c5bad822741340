use crate::entity::{Entity, Lifecycle};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Read access to the authoritative set of live entities
pub trait EntityLookup {
    fn by_index(&self, index: u32) -> Option<&Entity>;
    fn by_handle(&self, handle: u64) -> Option<&Entity>;
}

/// Live-entity table: the only place entity state is stored.
///
/// Indices elsewhere hold `EntityRef`s into this table and re-resolve on use.
#[derive(Debug, Default)]
pub struct EntityTable {
    /// index -> entity
    entities: HashMap<u32, Entity>,

    /// handle -> index, kept in lockstep with `entities`
    handles: HashMap<u64, u32>,

    /// Indices whose most recent operation was a removal
    retired: HashSet<u32>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entity occupying `entity.index`
    ///
    /// The decoder delivers full state on every update, so the stored record
    /// is replaced wholesale. A different handle at the same index means the
    /// slot was reused; the previous occupant's handle stops resolving.
    pub fn upsert(&mut self, entity: Entity) -> &Entity {
        let index = entity.index;
        if let Some(previous) = self.entities.get(&index) {
            if previous.handle != entity.handle {
                debug!(
                    index,
                    old_handle = previous.handle,
                    new_handle = entity.handle,
                    "Entity slot reused"
                );
                self.handles.remove(&previous.handle);
            }
        }
        self.handles.insert(entity.handle, index);
        self.retired.remove(&index);
        self.entities.insert(index, entity);
        &self.entities[&index]
    }

    /// Remove the entity at `index`, returning its last known state
    pub fn remove(&mut self, index: u32) -> Option<Entity> {
        let removed = self.entities.remove(&index)?;
        if self.handles.get(&removed.handle) == Some(&index) {
            self.handles.remove(&removed.handle);
        }
        self.retired.insert(index);
        Some(removed)
    }

    /// Remove every live entity, ordered by index
    pub fn drain(&mut self) -> Vec<Entity> {
        let mut drained: Vec<Entity> = self.entities.drain().map(|(_, e)| e).collect();
        drained.sort_by_key(|e| e.index);
        self.handles.clear();
        self.retired.extend(drained.iter().map(|e| e.index));
        drained
    }

    pub fn lifecycle(&self, index: u32) -> Lifecycle {
        if self.entities.contains_key(&index) {
            Lifecycle::Active
        } else if self.retired.contains(&index) {
            Lifecycle::Removed
        } else {
            Lifecycle::Absent
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityLookup for EntityTable {
    fn by_index(&self, index: u32) -> Option<&Entity> {
        self.entities.get(&index)
    }

    fn by_handle(&self, handle: u64) -> Option<&Entity> {
        let index = self.handles.get(&handle)?;
        self.entities.get(index)
    }
}
