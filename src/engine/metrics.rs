use crate::feed::ChatChannel;
use serde::{Deserialize, Serialize};

/// Counters for one engine run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Records delivered by the feed
    pub records: u64,
    pub ticks: u64,
    pub entity_updates: u64,
    /// LEFT/DELETED callbacks plus end-of-feed evictions
    pub entity_removals: u64,
    pub combat_log_entries: u64,
    pub matched_events: u64,
    /// Matching events rejected for going backwards in time
    pub rejected_out_of_order: u64,
    pub correlations: u64,
    pub say_text: u64,
    pub chat_messages: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_chat(&mut self, channel: ChatChannel) {
        match channel {
            ChatChannel::SayText2 => self.say_text += 1,
            ChatChannel::ChatMessage => self.chat_messages += 1,
        }
    }
}
