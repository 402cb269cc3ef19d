//! Transfer error taxonomy.
//!
//! Per-item failures (everything except `FatalSource`) never abort sibling
//! items or the other media class; they leave the item unrecorded so the next
//! run picks it up again.

use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Remote-imposed cooldown of `wait_secs` (before grace).
    #[error("rate limited: retry after {wait_secs}s")]
    RateLimited { wait_secs: u64 },
    /// Failure reported by the source for one item or chunk. Whether it is
    /// worth another attempt is up to `retry::classify`.
    #[error("source: {0}")]
    Source(#[source] SourceError),
    /// Stream ended before the announced length (or ran past it).
    #[error("short transfer: expected {expected} bytes, got {received}")]
    ShortTransfer { expected: u64, received: u64 },
    /// Local disk write, sync or rename failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// One chunk of a multi-chunk item failed; nothing was committed.
    #[error("chunk {index}/{count} failed: {source}")]
    PartialChunk {
        index: usize,
        count: usize,
        #[source]
        source: Box<TransferError>,
    },
    /// The progress record could not be written after the artifact was.
    #[error("progress persistence failed: {0}")]
    Persistence(#[source] std::io::Error),
    /// The source cannot be reached or listed at all.
    #[error("source failure: {0}")]
    FatalSource(#[source] SourceError),
}

impl From<SourceError> for TransferError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::RateLimited { wait_secs } => TransferError::RateLimited { wait_secs },
            SourceError::Io(io) => TransferError::Storage(io),
            other => TransferError::Source(other),
        }
    }
}

impl TransferError {
    /// Innermost error (looks through chunk wrappers).
    pub fn root(&self) -> &TransferError {
        match self {
            TransferError::PartialChunk { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.root(), TransferError::RateLimited { .. })
    }

    /// The source answered a ranged read with the whole body.
    pub fn is_range_ignored(&self) -> bool {
        matches!(self.root(), TransferError::Source(SourceError::RangeIgnored))
    }
}
