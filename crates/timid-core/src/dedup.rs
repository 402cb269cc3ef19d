//! Dedup guard: skip items that are already done.
//!
//! The progress window only remembers recent completions, so a miss there is
//! backed by a check for the finished artifact on disk. Either hit skips.
//! Within a run, [`InFlight`] keeps two items that resolve to the same file
//! from writing it at once.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::media::TransferItem;
use crate::progress::ProgressStore;
use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    /// Not seen: transfer it.
    Fresh,
    /// Id is in the class's recent-completion window.
    InWindow,
    /// The destination already holds a finished file.
    DestinationExists,
    /// Another item is being written to the same destination.
    InFlight,
}

impl DedupVerdict {
    pub fn is_skip(self) -> bool {
        !matches!(self, DedupVerdict::Fresh)
    }
}

impl fmt::Display for DedupVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DedupVerdict::Fresh => "fresh",
            DedupVerdict::InWindow => "recently completed",
            DedupVerdict::DestinationExists => "destination exists",
            DedupVerdict::InFlight => "destination in flight",
        })
    }
}

/// Decide whether `item` needs a transfer. Skips are logged at info.
pub async fn check(store: &ProgressStore, item: &TransferItem) -> DedupVerdict {
    let verdict = if store.is_likely_complete(item.class, &item.id).await {
        DedupVerdict::InWindow
    } else if storage::artifact_exists(&item.destination).await {
        DedupVerdict::DestinationExists
    } else {
        DedupVerdict::Fresh
    };
    if verdict.is_skip() {
        log_skip(item, verdict);
    }
    verdict
}

/// Claim `item`'s destination for one transfer. Fails with
/// [`DedupVerdict::InFlight`] while an earlier claim on the same path is held.
pub fn claim(in_flight: &Arc<InFlight>, item: &TransferItem) -> Result<DestinationClaim, DedupVerdict> {
    in_flight.claim(&item.destination).ok_or_else(|| {
        log_skip(item, DedupVerdict::InFlight);
        DedupVerdict::InFlight
    })
}

fn log_skip(item: &TransferItem, verdict: DedupVerdict) {
    tracing::info!(
        class = %item.class,
        item_id = %item.id,
        seq = item.sequence_id,
        file = %item.file_name(),
        reason = %verdict,
        "skip"
    );
}

/// Destinations currently being written.
#[derive(Debug, Default)]
pub struct InFlight {
    paths: Mutex<HashSet<PathBuf>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn paths(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn claim(self: &Arc<Self>, path: &Path) -> Option<DestinationClaim> {
        if !self.paths().insert(path.to_path_buf()) {
            return None;
        }
        Some(DestinationClaim {
            owner: Arc::clone(self),
            path: path.to_path_buf(),
        })
    }
}

/// Exclusive hold on one destination; released on drop.
#[derive(Debug)]
pub struct DestinationClaim {
    owner: Arc<InFlight>,
    path: PathBuf,
}

impl Drop for DestinationClaim {
    fn drop(&mut self) {
        self.owner.paths().remove(&self.path);
    }
}
