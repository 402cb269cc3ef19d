//! Progress store: per-class watermark and dedup window, persisted as JSON.
//!
//! One human-readable record per media class (`image_progress.json`,
//! `video_progress.json`) under a per-source state directory. Records are
//! loaded once, mutated after every completed item and rewritten atomically
//! (temp file, fsync, rename) so a crash mid-write keeps the previous state.

mod persist;
mod record;
mod store;

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

pub use record::ProgressRecord;
pub use store::ProgressStore;

/// Default dedup window size.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Short stable key for a source: first 16 hex chars of SHA-256 of its locator.
pub fn source_key(locator: &str) -> String {
    let digest = Sha256::digest(locator.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Default state directory for a source: `~/.local/state/timid/sources/<key>/`.
pub fn default_state_dir(locator: &str) -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("timid")?;
    Ok(xdg_dirs
        .get_state_home()
        .join("timid")
        .join("sources")
        .join(source_key(locator)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_key_is_stable_and_short() {
        let a = source_key("https://media.example.com/list?channel=1");
        let b = source_key("https://media.example.com/list?channel=1");
        let c = source_key("https://media.example.com/list?channel=2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
