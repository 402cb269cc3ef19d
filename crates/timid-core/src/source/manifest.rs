//! JSON manifest pages served by the listing endpoint.

use serde::Deserialize;
use std::path::Path;

use crate::media::{MediaClass, TransferItem};

use super::naming;
use super::SourceError;

/// Kind of entry as listed; anything other than image/video is not media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EntryKind {
    Image,
    Video,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ManifestEntry {
    pub id: String,
    pub sequence_id: u64,
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ManifestPage {
    #[serde(default)]
    pub items: Vec<ManifestEntry>,
    /// Watermark for the next page; `None` when the listing is exhausted.
    #[serde(default)]
    pub next_after: Option<u64>,
}

impl ManifestPage {
    pub(crate) fn parse(body: &[u8]) -> Result<Self, SourceError> {
        serde_json::from_slice(body).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

impl ManifestEntry {
    pub(crate) fn class(&self) -> Option<MediaClass> {
        match self.kind {
            EntryKind::Image => Some(MediaClass::Image),
            EntryKind::Video => Some(MediaClass::Video),
            EntryKind::Other => None,
        }
    }

    pub(crate) fn to_item(&self, root: &Path) -> Option<TransferItem> {
        let class = self.class()?;
        Some(TransferItem {
            id: self.id.clone(),
            sequence_id: self.sequence_id,
            class,
            size_bytes: self.size,
            locator: self.url.clone(),
            destination: naming::destination_for(
                root,
                class,
                self.sequence_id,
                &self.id,
                self.file_name.as_deref(),
            ),
        })
    }
}
