//! Media classes and the items a source hands to the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Category of transferable item. Each class has its own progress record,
/// its own slot pool and its own pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Image,
    Video,
}

impl MediaClass {
    pub const ALL: [MediaClass; 2] = [MediaClass::Image, MediaClass::Video];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaClass::Image => "image",
            MediaClass::Video => "video",
        }
    }
}

impl fmt::Display for MediaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote object to transfer. Produced by a [`crate::source::MediaSource`];
/// never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferItem {
    /// Stable identity of the media object (used by the dedup window).
    pub id: String,
    /// Position in the source ordering; resume watermark.
    pub sequence_id: u64,
    pub class: MediaClass,
    /// Total size in bytes as announced by the source (0 if unknown).
    pub size_bytes: u64,
    /// Where the source fetches the body from (a URL for HTTP sources).
    /// Opaque to the engine.
    pub locator: String,
    /// Final location of the artifact on local disk.
    pub destination: PathBuf,
}

impl TransferItem {
    /// File name component of the destination, for log lines.
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.destination.display().to_string())
    }
}

/// Half-open byte range `[start, end)` of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
