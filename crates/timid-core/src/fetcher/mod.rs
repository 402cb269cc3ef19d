//! Item fetcher: one entry point, two strategies.
//!
//! `SingleStream` reads the whole body into `<dest>.part` and renames it into
//! place; the item is retried as a unit. `Chunked` splits the item into byte
//! ranges fetched concurrently into staged chunk files (each chunk retried on
//! its own), then concatenates them in index order. Either way the destination
//! appears only once every byte is on disk.

mod chunked;
mod single;

use bytes::Bytes;
use futures::TryStreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{TimidConfig, VideoStrategy};
use crate::error::TransferError;
use crate::media::{ByteRange, MediaClass, TransferItem};
use crate::observer::TransferObserver;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::source::MediaSource;
use crate::storage::PartFile;

/// How one item's bytes are pulled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    SingleStream,
    Chunked { chunk_count: usize },
}

impl FetchStrategy {
    /// Videos go chunked unless configured otherwise, too small, of unknown
    /// size, or the source cannot serve ranges. Images are always one stream.
    pub fn for_item(cfg: &TimidConfig, item: &TransferItem, supports_ranges: bool) -> Self {
        let chunkable = item.class == MediaClass::Video
            && cfg.video_strategy == VideoStrategy::Chunked
            && supports_ranges
            && cfg.chunk_count > 1
            && item.size_bytes > 0
            && item.size_bytes >= cfg.chunk_min_bytes;
        if chunkable {
            FetchStrategy::Chunked {
                chunk_count: cfg.chunk_count,
            }
        } else {
            FetchStrategy::SingleStream
        }
    }
}

/// Shared handles for fetching items from one source.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn MediaSource>,
    policy: RetryPolicy,
    observer: Arc<dyn TransferObserver>,
    /// Set once the source answered a ranged read with the whole body.
    ranges_ignored: Arc<AtomicBool>,
}

impl Fetcher {
    pub fn new(
        source: Arc<dyn MediaSource>,
        policy: RetryPolicy,
        observer: Arc<dyn TransferObserver>,
    ) -> Self {
        Self {
            source,
            policy,
            observer,
            ranges_ignored: Arc::new(AtomicBool::new(false)),
        }
    }

    /// False once the source has been seen ignoring a range, even if it
    /// claims support.
    pub fn supports_ranges(&self) -> bool {
        self.source.supports_ranges() && !self.ranges_ignored.load(Ordering::Relaxed)
    }

    fn mark_ranges_ignored(&self) {
        if !self.ranges_ignored.swap(true, Ordering::Relaxed) {
            tracing::warn!("source ignores byte ranges, videos will be fetched whole");
        }
    }

    /// Transfer `item` to its destination. Returns bytes written. On error the
    /// destination is untouched and no temp or chunk file is left behind.
    pub async fn fetch(
        &self,
        item: &TransferItem,
        strategy: FetchStrategy,
    ) -> Result<u64, TransferError> {
        match strategy {
            FetchStrategy::Chunked { chunk_count } => {
                chunked::fetch_chunked(self, item, chunk_count).await
            }
            FetchStrategy::SingleStream => self.fetch_single_with_retry(item).await,
        }
    }

    async fn fetch_single_with_retry(&self, item: &TransferItem) -> Result<u64, TransferError> {
        run_with_retry(&self.policy, &item.id, || single::fetch_single(self, item)).await
    }

    /// Pipe the body of `item` (or `range` of it) into `part`, notifying the
    /// observer per read.
    async fn stream_into(
        &self,
        item: &TransferItem,
        range: Option<ByteRange>,
        part: &mut PartFile,
    ) -> Result<(), TransferError> {
        let mut body = self.source.open_stream(item, range).await?;
        while let Some(chunk) = body.try_next().await? {
            self.write_chunk(item, part, chunk).await?;
        }
        Ok(())
    }

    async fn write_chunk(
        &self,
        item: &TransferItem,
        part: &mut PartFile,
        chunk: Bytes,
    ) -> Result<(), TransferError> {
        part.write_all(&chunk).await?;
        self.observer.on_bytes(item, chunk.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn item(class: MediaClass, size: u64) -> TransferItem {
        TransferItem {
            id: "x".into(),
            sequence_id: 1,
            class,
            size_bytes: size,
            locator: String::new(),
            destination: PathBuf::from("/tmp/x"),
        }
    }

    #[test]
    fn images_are_single_stream() {
        let cfg = TimidConfig::default();
        assert_eq!(
            FetchStrategy::for_item(&cfg, &item(MediaClass::Image, 50 << 20), true),
            FetchStrategy::SingleStream
        );
    }

    #[test]
    fn large_videos_are_chunked() {
        let cfg = TimidConfig::default();
        assert_eq!(
            FetchStrategy::for_item(&cfg, &item(MediaClass::Video, 50 << 20), true),
            FetchStrategy::Chunked { chunk_count: 8 }
        );
    }

    #[test]
    fn video_fallbacks_to_single_stream() {
        let cfg = TimidConfig::default();
        let small = item(MediaClass::Video, 1000);
        let unknown = item(MediaClass::Video, 0);
        let big = item(MediaClass::Video, 50 << 20);
        assert_eq!(FetchStrategy::for_item(&cfg, &small, true), FetchStrategy::SingleStream);
        assert_eq!(FetchStrategy::for_item(&cfg, &unknown, true), FetchStrategy::SingleStream);
        assert_eq!(FetchStrategy::for_item(&cfg, &big, false), FetchStrategy::SingleStream);

        let single = TimidConfig {
            video_strategy: VideoStrategy::Single,
            ..TimidConfig::default()
        };
        assert_eq!(FetchStrategy::for_item(&single, &big, true), FetchStrategy::SingleStream);
    }
}
