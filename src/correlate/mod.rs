// Temporal correlation of recorded combat log events with holder-entity updates

use crate::config::{CorrelationConfig, IdentityConfig, LensConfig, OwnerReference, RepeatPolicy};
use crate::entity::{Entity, EntityOp, EntityRef};
use crate::event::{CombatLogEntry, Consideration, EventRecorder, UsageRecord, Vitals};
use crate::snapshot::{Delta, SnapshotDiffer};
use crate::state::{ClassHistogram, EntityLookup, HandleTable, IdentityIndex};
use crate::strings::StringTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

mod heroes;

pub use heroes::{hero_class_from_unit_name, read_vitals, UNKNOWN_CLASS};

/// Label for a holder whose kind attribute is missing or out of range
pub const UNKNOWN_KIND: &str = "unknown";

/// Domain key of a tracked identity (player id)
pub type DomainKey = i64;

/// A recorded event attributed to a holder-entity update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub owner_key: DomainKey,
    pub owner_class: String,
    pub holder_index: u32,
    pub holder_handle: u64,
    /// Sequence of the matched `UsageRecord`
    pub usage_sequence: usize,
    /// Event time of the matched `UsageRecord`
    pub timestamp: f64,
    /// Holder's reference-time attribute at this update
    pub reference_time: f64,
    /// Replay time of the holder update
    pub update_time: f64,
    /// Label decoded from the holder's kind attribute
    pub kind: String,
    /// Owner's attribute change across its last two updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_delta: Option<Delta>,
}

/// Per-identity state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityState {
    Unseen,
    Active,
}

/// Orchestrates the identity index, histogram, snapshot differ and event
/// recorder, and emits correlation records on holder-entity updates.
///
/// Precondition: callbacks arrive in capture order, one at a time, with
/// non-decreasing combat log timestamps. Out-of-order matching events are
/// rejected by the recorder instead of being correlated.
pub struct TemporalCorrelator {
    identity: IdentityConfig,
    policy: CorrelationConfig,
    record_vitals: bool,

    /// player id -> active hero
    identities: IdentityIndex<DomainKey>,
    /// "npc_dota_hero_*" unit name -> active hero
    unit_names: IdentityIndex<String>,
    /// hero class -> most recently updated hero of that class
    hero_classes: IdentityIndex<String>,

    histogram: ClassHistogram,
    snapshots: SnapshotDiffer<DomainKey>,
    recorder: EventRecorder,

    /// Usage sequences already correlated (RepeatPolicy::Once)
    consumed: HashSet<usize>,
    correlations: Vec<CorrelationRecord>,
}

impl TemporalCorrelator {
    pub fn new(config: &LensConfig) -> Self {
        Self {
            identity: config.identity.clone(),
            policy: config.correlation.clone(),
            record_vitals: config.filter.record_vitals,
            identities: IdentityIndex::new(),
            unit_names: IdentityIndex::new(),
            hero_classes: IdentityIndex::new(),
            histogram: ClassHistogram::new(),
            snapshots: SnapshotDiffer::new(config.snapshot.attributes.clone()),
            recorder: EventRecorder::new(config.filter.predicate()),
            consumed: HashSet::new(),
            correlations: Vec::new(),
        }
    }

    /// Apply one entity callback and return the correlations it produced.
    ///
    /// For removals `entity` is the entity's last known state; `store` must
    /// already reflect the callback (upserted or removed).
    pub fn on_entity_update<L: EntityLookup + ?Sized>(
        &mut self,
        entity: &Entity,
        ops: EntityOp,
        time: f64,
        store: &L,
    ) -> Vec<CorrelationRecord> {
        self.histogram.observe(&entity.class);

        if ops.is_removal() {
            self.evict(entity);
            return Vec::new();
        }

        if self.identity.class.matches(&entity.class) {
            self.track_identity(entity, time);
        }

        if self.policy.holder_class.matches(&entity.class) {
            return self.correlate_holder(entity, time, store);
        }

        Vec::new()
    }

    /// Offer one combat log entry to the recorder
    pub fn on_combat_log<T, L>(&mut self, entry: &CombatLogEntry, strings: &T, store: &L) -> Consideration
    where
        T: StringTable + ?Sized,
        L: EntityLookup + ?Sized,
    {
        let unit_names = &self.unit_names;
        let hero_classes = &self.hero_classes;
        let record_vitals = self.record_vitals;

        self.recorder.consider(entry, strings, |name| {
            if !record_vitals {
                return None;
            }
            hero_vitals(unit_names, hero_classes, store, name)
        })
    }

    fn track_identity(&mut self, hero: &Entity, time: f64) {
        let entity_ref = hero.entity_ref();
        self.hero_classes.upsert(hero.class.clone(), entity_ref);

        let unit_name = self
            .identity
            .unit_name_properties
            .iter()
            .find_map(|p| hero.get_str(p).filter(|n| n.starts_with("npc_dota_")));
        if let Some(name) = unit_name {
            self.unit_names.upsert(name.to_string(), entity_ref);
        }

        let Some(key) = hero.get_i64(&self.identity.key_property) else {
            debug!(
                index = hero.index,
                class = %hero.class,
                property = %self.identity.key_property,
                "Hero update without domain key"
            );
            return;
        };

        // Re-keyed entity: the old identity's history no longer applies
        if let Some(&previous_key) = self.identities.key_of(entity_ref) {
            if previous_key != key {
                self.snapshots.remove(&previous_key);
            }
        }

        let first_seen = self.identities.lookup(&key).is_none();
        self.identities.upsert(key, entity_ref);
        self.snapshots.update(key, hero, time);

        if first_seen {
            info!(key, class = %hero.class, index = hero.index, "Identity tracked");
        }
    }

    /// End-of-feed eviction of a still-live entity.
    ///
    /// No callback was delivered for it, so the histogram is left alone.
    pub fn evict_at_end(&mut self, entity: &Entity) {
        self.evict(entity);
    }

    fn evict(&mut self, entity: &Entity) {
        let entity_ref = entity.entity_ref();
        if let Some(key) = self.identities.remove(entity_ref) {
            self.snapshots.remove(&key);
            info!(key, class = %entity.class, "Identity evicted");
        }
        self.unit_names.remove(entity_ref);
        self.hero_classes.remove(entity_ref);
    }

    fn correlate_holder<L: EntityLookup + ?Sized>(
        &mut self,
        holder: &Entity,
        time: f64,
        store: &L,
    ) -> Vec<CorrelationRecord> {
        let Some(owner_key) = self.resolve_owner_key(holder, store) else {
            debug!(index = holder.index, class = %holder.class, "Holder owner unresolved");
            return Vec::new();
        };
        let Some(owner_ref) = self.identities.lookup(&owner_key) else {
            debug!(owner_key, "Holder owner identity unseen");
            return Vec::new();
        };
        let Some(owner) = HandleTable::new(store).follow(owner_ref) else {
            return Vec::new();
        };
        let Some(reference_time) = holder.get_f64(&self.policy.reference_time_property) else {
            debug!(
                index = holder.index,
                property = %self.policy.reference_time_property,
                "Holder without reference time"
            );
            return Vec::new();
        };

        let kind = self.kind_label(holder);
        let owner_delta = self
            .snapshots
            .delta(&owner_key)
            .map(|(previous, current)| Delta::between(previous, current));
        let once = self.policy.repeat == RepeatPolicy::Once;

        let mut emitted = Vec::new();
        for record in self.recorder.records() {
            if once && self.consumed.contains(&record.sequence) {
                continue;
            }
            if !self.is_subject(record, owner_ref, &owner.class) {
                continue;
            }
            if !self.admits(record.timestamp, reference_time) {
                continue;
            }

            emitted.push(CorrelationRecord {
                owner_key,
                owner_class: owner.class.clone(),
                holder_index: holder.index,
                holder_handle: holder.handle,
                usage_sequence: record.sequence,
                timestamp: record.timestamp,
                reference_time,
                update_time: time,
                kind: kind.clone(),
                owner_delta: owner_delta.clone(),
            });
        }

        for correlation in &emitted {
            debug!(
                owner_key,
                usage_sequence = correlation.usage_sequence,
                timestamp = correlation.timestamp,
                kind = %correlation.kind,
                "Correlated"
            );
            if once {
                self.consumed.insert(correlation.usage_sequence);
            }
        }
        self.correlations.extend(emitted.iter().cloned());
        emitted
    }

    /// Domain key named by the holder's owner reference; the caller checks it is ACTIVE
    fn resolve_owner_key<L: EntityLookup + ?Sized>(&self, holder: &Entity, store: &L) -> Option<DomainKey> {
        match &self.policy.owner {
            OwnerReference::DomainKey(property) => holder.get_i64(property),
            OwnerReference::Handle(property) => {
                let owner = HandleTable::new(store).resolve(holder.get_handle(property)?)?;
                owner.get_i64(&self.identity.key_property)
            }
        }
    }

    /// Whether `record`'s attacker is the owner: exact unit-name mapping first,
    /// then the derived class name
    fn is_subject(&self, record: &UsageRecord, owner_ref: EntityRef, owner_class: &str) -> bool {
        if self.unit_names.lookup(record.subject_name.as_str()) == Some(owner_ref) {
            return true;
        }
        hero_class_from_unit_name(&record.subject_name) == owner_class
    }

    /// Matching window: `timestamp > reference_time - epsilon`, optionally
    /// capped at `reference_time + window`
    pub fn admits(&self, timestamp: f64, reference_time: f64) -> bool {
        let after_start = timestamp > reference_time - self.policy.epsilon;
        let before_end = self
            .policy
            .window
            .map_or(true, |window| timestamp <= reference_time + window);
        after_start && before_end
    }

    /// Label for the holder's kind attribute; "unknown" when absent or out of range
    pub fn kind_label(&self, holder: &Entity) -> String {
        holder
            .get_i64(&self.policy.kind_property)
            .and_then(|v| usize::try_from(v).ok())
            .and_then(|i| self.policy.kind_labels.get(i))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_KIND.to_string())
    }

    pub fn identity_state(&self, key: DomainKey) -> IdentityState {
        match self.identities.lookup(&key) {
            Some(_) => IdentityState::Active,
            None => IdentityState::Unseen,
        }
    }

    pub fn identities(&self) -> &IdentityIndex<DomainKey> {
        &self.identities
    }

    pub fn histogram(&self) -> &ClassHistogram {
        &self.histogram
    }

    pub fn snapshots(&self) -> &SnapshotDiffer<DomainKey> {
        &self.snapshots
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn correlations(&self) -> &[CorrelationRecord] {
        &self.correlations
    }
}

fn hero_vitals<L: EntityLookup + ?Sized>(
    unit_names: &IdentityIndex<String>,
    hero_classes: &IdentityIndex<String>,
    store: &L,
    name: &str,
) -> Option<Vitals> {
    if name.is_empty() {
        return None;
    }
    let handles = HandleTable::new(store);
    let hero = unit_names
        .lookup(name)
        .and_then(|r| handles.follow(r))
        .or_else(|| {
            hero_classes
                .lookup(hero_class_from_unit_name(name).as_str())
                .and_then(|r| handles.follow(r))
        })?;
    read_vitals(hero)
}
