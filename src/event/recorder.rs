use super::{CombatLogEntry, CombatLogType, EventFilter, ResolvedNames};
use crate::strings::{StringResolver, StringTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Health/mana readout of a hero at the moment an event was recorded
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: Option<i64>,
    pub max_health: Option<i64>,
    pub mana: Option<f64>,
    pub max_mana: Option<f64>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.health.is_none()
            && self.max_health.is_none()
            && self.mana.is_none()
            && self.max_mana.is_none()
    }
}

/// Immutable record of one combat log entry that passed the filter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Position in the recorder's log
    pub sequence: usize,
    pub event_type: CombatLogType,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u32>,

    /// Resolved attacker name ("" when unresolved)
    pub subject_name: String,
    pub target_name: String,
    /// Resolved damage source name
    pub source_name: String,
    pub inflictor_name: String,

    /// Raw attacker name index, for re-deriving the acting identity
    pub raw_attacker_key: u32,
    pub value: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_vitals: Option<Vitals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_vitals: Option<Vitals>,
}

/// Result of offering one entry to the recorder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Consideration {
    /// Matched-event counter after this call
    pub count: usize,
    pub matched: bool,
}

/// Append-only log of combat log entries accepted by an `EventFilter`
pub struct EventRecorder {
    filter: EventFilter,
    log: Vec<UsageRecord>,
    matched: usize,
    out_of_order: usize,
    last_timestamp: Option<f64>,
}

impl EventRecorder {
    pub fn new(filter: EventFilter) -> Self {
        Self {
            filter,
            log: Vec::new(),
            matched: 0,
            out_of_order: 0,
            last_timestamp: None,
        }
    }

    /// Resolve, filter and (on match) record one entry.
    ///
    /// `vitals` is asked for the attacker's and target's current health/mana
    /// by resolved unit name; it is only consulted for matching entries.
    ///
    /// Matching entries whose timestamp is earlier than the last recorded one
    /// are rejected: the log must stay in non-decreasing time order.
    pub fn consider<T, F>(&mut self, entry: &CombatLogEntry, strings: &T, vitals: F) -> Consideration
    where
        T: StringTable + ?Sized,
        F: Fn(&str) -> Option<Vitals>,
    {
        if !self.filter.admits_type(entry.kind) {
            return self.skipped();
        }

        let resolver = StringResolver::combat_log(strings);
        let names = ResolvedNames {
            attacker: resolver.resolve(entry.attacker_name),
            target: resolver.resolve(entry.target_name),
            source: resolver.resolve(entry.damage_source_name),
            inflictor: resolver.resolve(entry.inflictor_name),
        };

        if !self.filter.matches(entry.kind, &names) {
            return self.skipped();
        }

        if let Some(last) = self.last_timestamp {
            if entry.timestamp < last {
                self.out_of_order += 1;
                warn!(
                    timestamp = entry.timestamp,
                    last_timestamp = last,
                    inflictor = %names.inflictor,
                    "Combat log entry out of time order, not recorded"
                );
                return self.skipped();
            }
        }

        let record = UsageRecord {
            sequence: self.log.len(),
            event_type: entry.kind,
            timestamp: entry.timestamp,
            tick: entry.tick,
            subject_name: names.attacker.to_string(),
            target_name: names.target.to_string(),
            source_name: names.source.to_string(),
            inflictor_name: names.inflictor.to_string(),
            raw_attacker_key: entry.attacker_name,
            value: entry.value,
            subject_vitals: vitals(names.attacker),
            target_vitals: vitals(names.target),
        };

        debug!(
            sequence = record.sequence,
            timestamp = record.timestamp,
            event_type = %record.event_type,
            attacker = %record.subject_name,
            inflictor = %record.inflictor_name,
            "Recorded combat log entry"
        );

        self.last_timestamp = Some(entry.timestamp);
        self.log.push(record);
        self.matched += 1;

        Consideration {
            count: self.matched,
            matched: true,
        }
    }

    fn skipped(&self) -> Consideration {
        Consideration {
            count: self.matched,
            matched: false,
        }
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.log
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Matching entries rejected for going backwards in time
    pub fn out_of_order(&self) -> usize {
        self.out_of_order
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}
