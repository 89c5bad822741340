use crate::entity::{Entity, EntityRef, NULL_HANDLE};
use crate::state::EntityLookup;

/// Resolves handles against the live-entity store on every call.
///
/// Holds no mapping of its own, so it can never return an entity the store
/// has already dropped.
pub struct HandleTable<'a, L: EntityLookup + ?Sized> {
    store: &'a L,
}

impl<'a, L: EntityLookup + ?Sized> HandleTable<'a, L> {
    pub fn new(store: &'a L) -> Self {
        Self { store }
    }

    /// Entity currently holding `handle`, or `None` for unknown, stale and null handles
    pub fn resolve(&self, handle: u64) -> Option<&'a Entity> {
        if handle == NULL_HANDLE {
            return None;
        }
        self.store.by_handle(handle)
    }

    /// Follow an `EntityRef`, rejecting it when the slot now holds a different entity
    pub fn follow(&self, entity_ref: EntityRef) -> Option<&'a Entity> {
        self.store
            .by_index(entity_ref.index)
            .filter(|e| e.handle == entity_ref.handle)
    }
}
