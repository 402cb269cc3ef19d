//! Media source collaborator: lists items and streams their bytes.
//!
//! Everything that talks to the remote service lives behind [`MediaSource`];
//! the engine only sees [`TransferItem`]s and byte streams. `http` provides a
//! concrete source backed by a paginated JSON manifest.

mod error;
pub mod http;
mod manifest;
pub mod naming;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::media::{ByteRange, TransferItem};

pub use error::SourceError;
pub use http::HttpManifestSource;

/// Lazy, ascending sequence of items after a watermark.
pub type ItemStream<'a> = BoxStream<'a, Result<TransferItem, SourceError>>;

/// Body of one item (or one range of it).
pub type ByteStream = BoxStream<'static, Result<Bytes, SourceError>>;

#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Items with `sequence_id > after`, in ascending sequence order. The stream
    /// is finite: it ends once the remote list is exhausted at call time.
    fn list_items(&self, after: u64) -> ItemStream<'_>;

    /// Open the body of `item`, whole or restricted to `range`.
    /// Rate-limit signals must surface as [`SourceError::RateLimited`].
    async fn open_stream(
        &self,
        item: &TransferItem,
        range: Option<ByteRange>,
    ) -> Result<ByteStream, SourceError>;

    /// Whether `open_stream` honours byte ranges. When false, chunked
    /// transfers fall back to a single stream.
    fn supports_ranges(&self) -> bool {
        true
    }
}
