use crate::entity::{Entity, EntityOp};
use crate::event::CombatLogEntry;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

#[cfg(test)]
mod tests;

/// One decoded callback from a captured replay feed.
///
/// Feeds are JSON lines, one record per line, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedRecord {
    /// Seconds per tick announced by the replay header
    TickInterval { seconds: f64 },

    /// Start of a new tick
    Tick { tick: u32 },

    /// String table entry added or replaced
    #[serde(rename = "string")]
    StringEntry {
        table: String,
        index: i32,
        value: String,
    },

    /// Entity lifecycle callback
    Entity(EntityUpdate),

    /// Discrete combat log event
    CombatLog(CombatLogEntry),

    /// Chat user message (counted, contents not retained)
    Chat { channel: ChatChannel },
}

/// Entity callback payload: full entity state plus the operation flags
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u32>,
    pub ops: EntityOp,
    pub entity: Entity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatChannel {
    SayText2,
    ChatMessage,
}

/// Feed-level failure
#[derive(Debug)]
pub enum FeedError {
    /// Normal end of the feed
    EndOfStream,
    Io(io::Error),
    Malformed { line: usize, message: String },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::EndOfStream => write!(f, "end of feed"),
            FeedError::Io(e) => write!(f, "feed read failed: {}", e),
            FeedError::Malformed { line, message } => {
                write!(f, "malformed feed record at line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FeedError {
    fn from(e: io::Error) -> Self {
        FeedError::Io(e)
    }
}

/// Pull-based source of feed records.
///
/// Returns `FeedError::EndOfStream` once exhausted; any other error is fatal.
pub trait FeedSource {
    fn next_record(&mut self) -> Result<FeedRecord, FeedError>;
}

/// JSON-lines feed reader
pub struct FeedReader<R> {
    reader: R,
    buf: String,
    line: usize,
}

impl<R: BufRead> FeedReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line: 0,
        }
    }

    /// Lines consumed so far
    pub fn line(&self) -> usize {
        self.line
    }
}

impl FeedReader<Box<dyn BufRead + Send>> {
    /// Open a feed file, decompressing when the extension is `.gz`
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open feed file {}", path.display()))?;

        let is_compressed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "gz")
            .unwrap_or(false);

        let reader: Box<dyn BufRead + Send> = if is_compressed {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Self::from_reader(reader))
    }
}

impl<R: BufRead> FeedSource for FeedReader<R> {
    fn next_record(&mut self) -> Result<FeedRecord, FeedError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Err(FeedError::EndOfStream);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            return serde_json::from_str(text).map_err(|e| FeedError::Malformed {
                line: self.line,
                message: e.to_string(),
            });
        }
    }
}

/// In-memory feed
#[derive(Debug, Default)]
pub struct VecFeed {
    records: VecDeque<FeedRecord>,
}

impl VecFeed {
    pub fn new(records: Vec<FeedRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn push(&mut self, record: FeedRecord) {
        self.records.push_back(record);
    }

    /// Records not yet delivered
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl FeedSource for VecFeed {
    fn next_record(&mut self) -> Result<FeedRecord, FeedError> {
        self.records.pop_front().ok_or(FeedError::EndOfStream)
    }
}
