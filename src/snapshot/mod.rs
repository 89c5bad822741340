use crate::entity::{Entity, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;


/// Source of named attribute values (an entity's property bag)
pub trait AttributeReader {
    fn read(&self, name: &str) -> Option<PropertyValue>;
}

impl AttributeReader for Entity {
    fn read(&self, name: &str) -> Option<PropertyValue> {
        self.get(name).cloned()
    }
}

/// One declared attribute inside a generation; `None` = not observed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub value: Option<PropertyValue>,
}

/// Attribute readout captured at one update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Replay time of the update, in seconds
    pub time: f64,
    /// One slot per declared attribute, in declaration order
    pub attributes: Vec<AttributeValue>,
}

impl Generation {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_ref())
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Before/after pair for one attribute
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    pub before: Option<PropertyValue>,
    pub after: Option<PropertyValue>,
}

impl AttributeChange {
    pub fn is_changed(&self) -> bool {
        self.before != self.after
    }
}

/// Owned before/after view of two consecutive generations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub previous_time: f64,
    pub current_time: f64,
    pub changes: Vec<AttributeChange>,
}

impl Delta {
    pub fn between(previous: &Generation, current: &Generation) -> Self {
        let changes = current
            .attributes
            .iter()
            .map(|attr| AttributeChange {
                name: attr.name.clone(),
                before: previous.get(&attr.name).cloned(),
                after: attr.value.clone(),
            })
            .collect();

        Self {
            previous_time: previous.time,
            current_time: current.time,
            changes,
        }
    }

    pub fn change(&self, name: &str) -> Option<&AttributeChange> {
        self.changes.iter().find(|c| c.name == name)
    }
}

struct Slot {
    previous: Option<Generation>,
    current: Generation,
}

/// Rolling two-generation snapshot of a fixed attribute set, per tracked identity.
///
/// Each update shifts `current` into `previous` and builds a fresh `current`
/// from whatever attributes the update carried; nothing is carried forward.
pub struct SnapshotDiffer<K> {
    attributes: Vec<String>,
    slots: HashMap<K, Slot>,
}

impl<K: Eq + Hash> SnapshotDiffer<K> {
    pub fn new(attributes: Vec<String>) -> Self {
        Self {
            attributes,
            slots: HashMap::new(),
        }
    }

    pub fn update<R: AttributeReader + ?Sized>(&mut self, key: K, reader: &R, time: f64) {
        let generation = Generation {
            time,
            attributes: self
                .attributes
                .iter()
                .map(|name| AttributeValue {
                    name: name.clone(),
                    value: reader.read(name),
                })
                .collect(),
        };

        match self.slots.get_mut(&key) {
            Some(slot) => {
                let previous = std::mem::replace(&mut slot.current, generation);
                slot.previous = Some(previous);
            }
            None => {
                self.slots.insert(
                    key,
                    Slot {
                        previous: None,
                        current: generation,
                    },
                );
            }
        }
    }

    /// `(previous, current)` once two generations exist for `key`
    pub fn delta(&self, key: &K) -> Option<(&Generation, &Generation)> {
        let slot = self.slots.get(key)?;
        Some((slot.previous.as_ref()?, &slot.current))
    }

    pub fn current(&self, key: &K) -> Option<&Generation> {
        self.slots.get(key).map(|s| &s.current)
    }

    /// Destroy the entry for an evicted identity
    pub fn remove(&mut self, key: &K) -> bool {
        self.slots.remove(key).is_some()
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
