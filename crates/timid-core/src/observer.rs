//! Transfer observer: per-item and per-byte progress notifications.
//!
//! The pipeline and fetchers call into a [`TransferObserver`] so a front end
//! can render progress without the engine knowing how. [`ByteCounter`] keeps
//! per-class totals that a caller can poll for rate and throughput.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::dedup::DedupVerdict;
use crate::media::{MediaClass, TransferItem};
use crate::pipeline::DriverState;

/// How one listed item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Written to its destination. `persisted` is false when the progress
    /// record could not be saved afterwards.
    Completed { bytes: u64, persisted: bool },
    /// Dedup guard said it is already done.
    Skipped(DedupVerdict),
    /// Abandoned after a rate-limit cooldown.
    RateLimited,
    /// Abandoned after retries ran out or a fatal error.
    Failed,
}

impl ItemOutcome {
    /// Abandoned items are retried by the next run.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, ItemOutcome::RateLimited | ItemOutcome::Failed)
    }
}

/// All methods default to no-ops. Implementations must be cheap: `on_bytes`
/// runs on every read chunk.
pub trait TransferObserver: Send + Sync {
    fn on_class_state(&self, _class: MediaClass, _state: DriverState) {}
    fn on_item_started(&self, _item: &TransferItem) {}
    /// `bytes` just written for `item`. Retried reads are counted again.
    fn on_bytes(&self, _item: &TransferItem, _bytes: u64) {}
    fn on_item_finished(&self, _item: &TransferItem, _outcome: &ItemOutcome) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransferObserver for NoopObserver {}

/// Snapshot of one class's throughput (CLI-friendly).
#[derive(Debug, Clone)]
pub struct ClassProgress {
    pub class: MediaClass,
    /// Bytes received so far.
    pub bytes_done: u64,
    /// Items written to disk.
    pub items_done: u64,
    /// Seconds since the counter was created.
    pub elapsed_secs: f64,
}

impl ClassProgress {
    /// Bytes per second (0 if no time elapsed).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }
}

/// Observer that accumulates per-class byte and item totals.
#[derive(Debug)]
pub struct ByteCounter {
    started: Instant,
    bytes: [AtomicU64; 2],
    items: [AtomicU64; 2],
}

impl Default for ByteCounter {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(class: MediaClass) -> usize {
    match class {
        MediaClass::Image => 0,
        MediaClass::Video => 1,
    }
}

impl ByteCounter {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            bytes: [AtomicU64::new(0), AtomicU64::new(0)],
            items: [AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    pub fn snapshot(&self, class: MediaClass) -> ClassProgress {
        ClassProgress {
            class,
            bytes_done: self.bytes[slot(class)].load(Ordering::Relaxed),
            items_done: self.items[slot(class)].load(Ordering::Relaxed),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

impl TransferObserver for ByteCounter {
    fn on_bytes(&self, item: &TransferItem, bytes: u64) {
        self.bytes[slot(item.class)].fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_item_finished(&self, item: &TransferItem, outcome: &ItemOutcome) {
        if let ItemOutcome::Completed { .. } = outcome {
            self.items[slot(item.class)].fetch_add(1, Ordering::Relaxed);
        }
    }
}
