use crate::correlate::CorrelationRecord;
use crate::engine::RunMetrics;
use crate::event::UsageRecord;
use crate::state::ClassCount;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use uuid::Uuid;


/// Everything one replay run produced
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    /// Report format version (for future schema evolution)
    pub report_version: String,

    /// Time-ordered run identifier
    pub run_id: Uuid,

    /// Timestamp when the report was created
    pub created_at: DateTime<Utc>,

    /// Last tick seen
    pub ticks: u32,

    /// True when the match limit ended the run
    pub stopped_early: bool,

    /// Entity classes by update count, descending
    pub histogram: Vec<ClassCount>,

    pub usages: Vec<UsageRecord>,

    pub correlations: Vec<CorrelationRecord>,

    /// Watched handle -> class name
    pub handle_lookups: BTreeMap<u64, String>,

    pub metrics: RunMetrics,
}

impl Report {
    pub fn new(
        ticks: u32,
        stopped_early: bool,
        histogram: Vec<ClassCount>,
        usages: Vec<UsageRecord>,
        correlations: Vec<CorrelationRecord>,
        handle_lookups: BTreeMap<u64, String>,
        metrics: RunMetrics,
    ) -> Self {
        Self {
            report_version: "1".to_string(),
            run_id: Uuid::now_v7(),
            created_at: Utc::now(),
            ticks,
            stopped_early,
            histogram,
            usages,
            correlations,
            handle_lookups,
            metrics,
        }
    }

    /// Save report as JSON, gzip-compressed when the path ends in `.gz`
    ///
    /// Uses atomic write: writes to .tmp file, fsyncs, then renames.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize report to JSON")?;

        let tmp_path = path.with_extension("tmp");

        {
            let tmp_file = File::create(&tmp_path)
                .context("Failed to create temporary report file")?;

            let file = if is_compressed(path) {
                let mut encoder = GzEncoder::new(tmp_file, Compression::default());
                encoder
                    .write_all(json.as_bytes())
                    .context("Failed to write compressed report data")?;
                encoder.finish().context("Failed to finish compression")?
            } else {
                let mut file = tmp_file;
                file.write_all(json.as_bytes())
                    .context("Failed to write report data")?;
                file
            };

            file.sync_all()
                .context("Failed to sync report file to disk")?;
        }

        fs::rename(&tmp_path, path)
            .context("Failed to rename temporary report file")?;

        Ok(())
    }

    /// Load a report written by `save_to_file`
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).context("Failed to open report file")?;

        let mut json = String::new();
        if is_compressed(path) {
            GzDecoder::new(file)
                .read_to_string(&mut json)
                .context("Failed to decompress report file")?;
        } else {
            let mut file = file;
            file.read_to_string(&mut json)
                .context("Failed to read report file")?;
        }

        serde_json::from_str(&json).context("Failed to deserialize report JSON")
    }

    /// Recorded events attributed to at least one holder update
    pub fn correlated_usages(&self) -> usize {
        let mut sequences: Vec<usize> = self
            .correlations
            .iter()
            .map(|c| c.usage_sequence)
            .collect();
        sequences.sort_unstable();
        sequences.dedup();
        sequences.len()
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}
