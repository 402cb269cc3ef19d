//! Disk I/O and file lifecycle.
//!
//! Artifacts are written to a `.part` sibling, synced, and atomically renamed
//! into place, so a destination that exists is always complete. Chunked
//! transfers stage each range in its own file under a `temp/` directory next
//! to the destination and are concatenated in index order.

mod writer;

use std::io;
use std::path::{Path, PathBuf};

pub use writer::PartFile;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Directory holding staged chunk files, next to the destination.
pub const CHUNK_DIR: &str = "temp";

/// Path for the temp file: appends `.part` to the final path (e.g. `clip.mp4` → `clip.mp4.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Staging directory for chunk files of items bound for `final_path`'s directory.
pub fn chunk_dir(final_path: &Path) -> PathBuf {
    final_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CHUNK_DIR)
}

/// Staged file for one chunk: `chunk_<seq>_<index>_<count>.part`.
pub fn chunk_path(final_path: &Path, sequence_id: u64, index: usize, count: usize) -> PathBuf {
    chunk_dir(final_path).join(format!(
        "chunk_{}_{}_{}{}",
        sequence_id, index, count, TEMP_SUFFIX
    ))
}

/// Remove `path` if it exists.
pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove `dir` if it is empty. Returns true if it was removed. A missing or
/// non-empty directory is not an error.
pub async fn remove_dir_if_empty(dir: &Path) -> bool {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(_) => return false,
    };
    match entries.next_entry().await {
        Ok(None) => tokio::fs::remove_dir(dir).await.is_ok(),
        _ => false,
    }
}

/// True if a finished artifact exists at `path`. `.part` files never count.
pub async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
