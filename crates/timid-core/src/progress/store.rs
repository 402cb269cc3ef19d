use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::TransferError;
use crate::media::MediaClass;

use super::persist::{read_json, write_json_atomic};
use super::record::ProgressRecord;

/// Owns both class records. The mutex spans load-merge-persist so concurrent
/// completions are serialized and never drop an id or regress the watermark.
pub struct ProgressStore {
    dir: PathBuf,
    capacity: usize,
    records: Mutex<HashMap<MediaClass, ProgressRecord>>,
}

impl ProgressStore {
    /// Load both records from `dir` (missing or corrupt files start fresh).
    pub async fn open(dir: impl Into<PathBuf>, capacity: usize) -> Self {
        let dir = dir.into();
        let mut records = HashMap::new();
        for class in MediaClass::ALL {
            let record = read_json::<ProgressRecord>(&Self::path_in(&dir, class))
                .await
                .map(|r| r.with_capacity(capacity))
                .unwrap_or_else(|| ProgressRecord::new(capacity));
            tracing::debug!(
                %class,
                last_sequence_id = record.last_sequence_id,
                window = record.recent_completed_ids.len(),
                "loaded progress record"
            );
            records.insert(class, record);
        }
        Self {
            dir,
            capacity,
            records: Mutex::new(records),
        }
    }

    fn path_in(dir: &Path, class: MediaClass) -> PathBuf {
        dir.join(format!("{}_progress.json", class.as_str()))
    }

    /// File backing `class`'s record.
    pub fn path_for(&self, class: MediaClass) -> PathBuf {
        Self::path_in(&self.dir, class)
    }

    /// Snapshot of the current record for `class`.
    pub async fn load(&self, class: MediaClass) -> ProgressRecord {
        self.records
            .lock()
            .await
            .get(&class)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::new(self.capacity))
    }

    /// Window membership only; false negatives are expected for old ids.
    pub async fn is_likely_complete(&self, class: MediaClass, item_id: &str) -> bool {
        self.records
            .lock()
            .await
            .get(&class)
            .map(|r| r.contains(item_id))
            .unwrap_or(false)
    }

    /// Listing watermark for the next pass of `class`.
    pub async fn resume_after(&self, class: MediaClass) -> u64 {
        self.load(class).await.resume_after()
    }

    /// Record one completed item and persist the whole record.
    pub async fn record_completion(
        &self,
        class: MediaClass,
        sequence_id: u64,
        item_id: &str,
    ) -> Result<(), TransferError> {
        let mut records = self.records.lock().await;
        let record = records
            .entry(class)
            .or_insert_with(|| ProgressRecord::new(self.capacity));
        if !record.record_completion(sequence_id, item_id) {
            return Ok(());
        }
        write_json_atomic(&self.path_for(class), record)
            .await
            .map_err(TransferError::Persistence)
    }

    /// Close a class pass. A complete pass with nothing abandoned clears the
    /// rescan floor; otherwise the floor drops to the lowest abandoned id.
    pub async fn finish_pass(
        &self,
        class: MediaClass,
        lowest_abandoned: Option<u64>,
        listing_complete: bool,
    ) -> Result<(), TransferError> {
        let mut records = self.records.lock().await;
        let record = records
            .entry(class)
            .or_insert_with(|| ProgressRecord::new(self.capacity));
        let floor = match (listing_complete, lowest_abandoned, record.rescan_from) {
            (true, None, _) => None,
            (true, Some(low), _) => Some(low),
            (false, Some(low), Some(old)) => Some(low.min(old)),
            (false, low, old) => low.or(old),
        };
        if floor == record.rescan_from {
            return Ok(());
        }
        record.rescan_from = floor;
        write_json_atomic(&self.path_for(class), record)
            .await
            .map_err(TransferError::Persistence)
    }

    /// Forget everything about `class` (memory and disk).
    pub async fn reset(&self, class: MediaClass) -> std::io::Result<()> {
        let mut records = self.records.lock().await;
        records.insert(class, ProgressRecord::new(self.capacity));
        crate::storage::remove_if_exists(&self.path_for(class)).await
    }
}
