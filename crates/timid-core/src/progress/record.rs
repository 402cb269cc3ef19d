//! Per-class progress record and its sliding dedup window.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::DEFAULT_CAPACITY;

/// How far a media class got, and which items finished recently.
///
/// `recent_completed_ids` is a FIFO window, not a full history: ids older than
/// `capacity` completions are evicted, so absence proves nothing on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    /// Highest sequence id ever completed (max, never regresses).
    pub last_sequence_id: u64,
    /// Recently completed item ids, oldest first.
    pub recent_completed_ids: VecDeque<String>,
    pub capacity: usize,
    /// Lowest sequence id abandoned by the last unfinished pass; the next pass
    /// lists from just below it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescan_from: Option<u64>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ProgressRecord {
    pub fn new(capacity: usize) -> Self {
        Self {
            last_sequence_id: 0,
            recent_completed_ids: VecDeque::new(),
            capacity: capacity.max(1),
            rescan_from: None,
        }
    }

    /// Apply `capacity` (config wins over the file) and trim the window.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self.evict_overflow();
        self
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.recent_completed_ids.iter().any(|id| id == item_id)
    }

    /// Merge one completion: watermark via max, id appended once, oldest
    /// evicted past capacity. Returns true if anything changed.
    pub fn record_completion(&mut self, sequence_id: u64, item_id: &str) -> bool {
        let mut changed = false;
        if sequence_id > self.last_sequence_id {
            self.last_sequence_id = sequence_id;
            changed = true;
        }
        if !self.contains(item_id) {
            self.recent_completed_ids.push_back(item_id.to_string());
            self.evict_overflow();
            changed = true;
        }
        changed
    }

    /// Listing watermark for the next pass.
    pub fn resume_after(&self) -> u64 {
        match self.rescan_from {
            Some(floor) => floor.saturating_sub(1).min(self.last_sequence_id),
            None => self.last_sequence_id,
        }
    }

    fn evict_overflow(&mut self) {
        while self.recent_completed_ids.len() > self.capacity {
            self.recent_completed_ids.pop_front();
        }
    }
}
