//! One item's trip: fetch, then record. Runs inside a spawned task that holds
//! the item's slot.

use std::sync::Arc;

use crate::config::TimidConfig;
use crate::fetcher::{FetchStrategy, Fetcher};
use crate::media::TransferItem;
use crate::observer::{ItemOutcome, TransferObserver};
use crate::progress::ProgressStore;

#[derive(Clone)]
pub(super) struct ItemTask {
    pub(super) fetcher: Fetcher,
    pub(super) store: Arc<ProgressStore>,
    pub(super) observer: Arc<dyn TransferObserver>,
    pub(super) config: Arc<TimidConfig>,
}

impl ItemTask {
    pub(super) async fn transfer(&self, item: &TransferItem) -> ItemOutcome {
        self.observer.on_item_started(item);
        let strategy = FetchStrategy::for_item(&self.config, item, self.fetcher.supports_ranges());
        tracing::debug!(
            class = %item.class,
            item_id = %item.id,
            seq = item.sequence_id,
            file = %item.file_name(),
            bytes = item.size_bytes,
            ?strategy,
            "transfer starting"
        );

        let outcome = match self.fetcher.fetch(item, strategy).await {
            Ok(bytes) => {
                tracing::info!(
                    class = %item.class,
                    item_id = %item.id,
                    seq = item.sequence_id,
                    file = %item.file_name(),
                    bytes,
                    "completed"
                );
                let persisted = self.record(item).await;
                ItemOutcome::Completed { bytes, persisted }
            }
            Err(e) if e.is_rate_limited() => {
                tracing::warn!(
                    class = %item.class,
                    item_id = %item.id,
                    seq = item.sequence_id,
                    file = %item.file_name(),
                    bytes = item.size_bytes,
                    error = %e,
                    "abandoned after rate-limit cooldown"
                );
                ItemOutcome::RateLimited
            }
            Err(e) => {
                tracing::warn!(
                    class = %item.class,
                    item_id = %item.id,
                    seq = item.sequence_id,
                    file = %item.file_name(),
                    bytes = item.size_bytes,
                    error = %e,
                    "transfer failed, item left for next run"
                );
                ItemOutcome::Failed
            }
        };
        self.observer.on_item_finished(item, &outcome);
        outcome
    }

    /// Record completion after the artifact is in place. A failure here keeps
    /// the file but loses the record; the next run skips it via the
    /// destination check (or fetches it again if the file moved).
    async fn record(&self, item: &TransferItem) -> bool {
        match self
            .store
            .record_completion(item.class, item.sequence_id, &item.id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    class = %item.class,
                    item_id = %item.id,
                    seq = item.sequence_id,
                    file = %item.file_name(),
                    error = %e,
                    "progress not saved, item may be fetched again next run"
                );
                false
            }
        }
    }
}
