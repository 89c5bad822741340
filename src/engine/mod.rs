use crate::config::LensConfig;
use crate::correlate::{CorrelationRecord, TemporalCorrelator};
use crate::event::CombatLogEntry;
use crate::feed::{EntityUpdate, FeedError, FeedRecord, FeedSource};
use crate::report::Report;
use crate::state::{EntityLookup, EntityTable, HandleTable};
use crate::strings::StringTables;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

mod metrics;

pub use metrics::RunMetrics;

/// Whether the driver should deliver the next record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Outcome of driving a feed to completion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub last_tick: u32,
    pub stopped_early: bool,
}

/// Replay analysis engine.
///
/// Owns all replay state and applies feed records one at a time, in
/// delivery order. Correlations are also published on a broadcast channel
/// for live consumers.
pub struct LensEngine {
    /// Authoritative live entities
    table: EntityTable,

    strings: StringTables,

    correlator: TemporalCorrelator,

    tick: u32,

    /// Seconds per tick
    tick_interval: f64,

    /// Handles to resolve on every entity update
    watched: Vec<u64>,

    /// handle -> class name, last resolution wins
    handle_lookups: BTreeMap<u64, String>,

    /// Stop after this many recorded events (0 = never)
    max_matches: usize,

    stop_requested: bool,

    metrics: RunMetrics,

    /// Broadcast channel for correlation records
    correlation_tx: broadcast::Sender<CorrelationRecord>,
}

impl LensEngine {
    pub fn new(config: &LensConfig) -> Self {
        let (correlation_tx, _) = broadcast::channel(1000);

        Self {
            table: EntityTable::new(),
            strings: StringTables::new(),
            correlator: TemporalCorrelator::new(config),
            tick: 0,
            tick_interval: config.time.tick_interval,
            watched: config.handles.watch.clone(),
            handle_lookups: BTreeMap::new(),
            max_matches: config.filter.max_matches,
            stop_requested: false,
            metrics: RunMetrics::new(),
            correlation_tx,
        }
    }

    /// Subscribe to correlation records as they are emitted
    pub fn subscribe(&self) -> broadcast::Receiver<CorrelationRecord> {
        self.correlation_tx.subscribe()
    }

    /// Replay time of the current tick in seconds
    pub fn time(&self) -> f64 {
        f64::from(self.tick) * self.tick_interval
    }

    /// Apply one feed record.
    ///
    /// Returns `Flow::Stop` once the match limit is reached; records offered
    /// after that are ignored.
    pub fn process(&mut self, record: FeedRecord) -> Flow {
        if self.stop_requested {
            return Flow::Stop;
        }
        self.metrics.records += 1;

        match record {
            FeedRecord::TickInterval { seconds } => self.set_tick_interval(seconds),
            FeedRecord::Tick { tick } => {
                self.tick = tick;
                self.metrics.ticks += 1;
            }
            FeedRecord::StringEntry {
                table,
                index,
                value,
            } => self.strings.insert(&table, index, value),
            FeedRecord::Entity(update) => self.apply_entity(update),
            FeedRecord::CombatLog(entry) => self.apply_combat_log(entry),
            FeedRecord::Chat { channel } => self.metrics.record_chat(channel),
        }

        if self.stop_requested {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Drive `source` until it ends, the engine stops, or the feed fails
    pub fn run<S: FeedSource + ?Sized>(&mut self, source: &mut S) -> Result<RunSummary> {
        let mut records = 0;

        loop {
            let record = match source.next_record() {
                Ok(record) => record,
                Err(FeedError::EndOfStream) => break,
                Err(e) => return Err(e).context("Feed failed"),
            };
            records += 1;

            if self.process(record) == Flow::Stop {
                break;
            }
        }

        let summary = RunSummary {
            records,
            last_tick: self.tick,
            stopped_early: self.stop_requested,
        };

        info!(
            records = summary.records,
            last_tick = summary.last_tick,
            stopped_early = summary.stopped_early,
            matched = self.metrics.matched_events,
            correlations = self.metrics.correlations,
            "Feed finished"
        );

        Ok(summary)
    }

    /// End of feed: evict every live entity and build the report
    pub fn finish(&mut self) -> Report {
        let remaining = self.table.drain();
        debug!(count = remaining.len(), "Evicting live entities at end of feed");

        for entity in &remaining {
            self.metrics.entity_removals += 1;
            self.correlator.evict_at_end(entity);
        }

        Report::new(
            self.tick,
            self.stop_requested,
            self.correlator.histogram().snapshot(),
            self.correlator.recorder().records().to_vec(),
            self.correlator.correlations().to_vec(),
            self.handle_lookups.clone(),
            self.metrics.clone(),
        )
    }

    fn set_tick_interval(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            info!(seconds, "Tick interval set");
            self.tick_interval = seconds;
        } else {
            warn!(seconds, "Ignoring invalid tick interval");
        }
    }

    fn apply_entity(&mut self, update: EntityUpdate) {
        if let Some(tick) = update.tick {
            self.tick = tick;
        }
        let time = self.time();
        let index = update.entity.index;

        if update.ops.is_removal() {
            self.metrics.entity_removals += 1;
            let removed = self.table.remove(index).unwrap_or(update.entity);
            self.correlator
                .on_entity_update(&removed, update.ops, time, &self.table);
            return;
        }

        self.metrics.entity_updates += 1;
        self.table.upsert(update.entity);
        let Some(entity) = self.table.by_index(index) else {
            return;
        };

        let emitted = self
            .correlator
            .on_entity_update(entity, update.ops, time, &self.table);
        self.resolve_watched();
        self.publish(emitted);
    }

    fn apply_combat_log(&mut self, entry: CombatLogEntry) {
        self.metrics.combat_log_entries += 1;

        let consideration = self
            .correlator
            .on_combat_log(&entry, &self.strings, &self.table);
        self.metrics.rejected_out_of_order = self.correlator.recorder().out_of_order() as u64;
        if !consideration.matched {
            return;
        }
        self.metrics.matched_events += 1;

        if self.max_matches > 0 && consideration.count >= self.max_matches {
            info!(max_matches = self.max_matches, "Match limit reached, stopping");
            self.stop_requested = true;
        }
    }

    fn resolve_watched(&mut self) {
        let handles = HandleTable::new(&self.table);
        for &handle in &self.watched {
            if let Some(entity) = handles.resolve(handle) {
                self.handle_lookups.insert(handle, entity.class.clone());
            }
        }
    }

    fn publish(&mut self, emitted: Vec<CorrelationRecord>) {
        for record in emitted {
            self.metrics.correlations += 1;
            info!(
                owner_key = record.owner_key,
                owner_class = %record.owner_class,
                timestamp = record.timestamp,
                reference_time = record.reference_time,
                kind = %record.kind,
                "Correlation"
            );
            // No subscribers is fine
            let _ = self.correlation_tx.send(record);
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn tick_interval(&self) -> f64 {
        self.tick_interval
    }

    pub fn entities(&self) -> &EntityTable {
        &self.table
    }

    pub fn correlator(&self) -> &TemporalCorrelator {
        &self.correlator
    }

    pub fn handle_lookups(&self) -> &BTreeMap<u64, String> {
        &self.handle_lookups
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_requested
    }
}
