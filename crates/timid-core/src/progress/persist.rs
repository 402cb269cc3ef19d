//! Crash-safe JSON persistence: write temp, fsync, rename over the original.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

fn tmp_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".tmp");
    PathBuf::from(o)
}

/// Atomically replace `path` with the pretty JSON of `value`. Either the old
/// or the new content survives a crash; never a torn file.
pub(super) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(path);
    let mut f = tokio::fs::File::create(&tmp).await?;
    f.write_all(&json).await?;
    f.flush().await?;
    f.sync_all().await?;
    drop(f);
    tokio::fs::rename(&tmp, path).await?;
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            if let Ok(dir) = tokio::fs::File::open(parent).await {
                let _ = dir.sync_all().await;
            }
        }
    }
    Ok(())
}

/// Read and parse `path`. Missing file is `None`; unreadable or corrupt
/// content is logged and also yields `None` so callers start fresh.
pub(super) async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read progress record, starting fresh");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt progress record, starting fresh");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn atomic_write_replaces_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("r.json");
        let mut m = BTreeMap::new();
        m.insert("a", 1);
        write_json_atomic(&path, &m).await.unwrap();
        m.insert("b", 2);
        write_json_atomic(&path, &m).await.unwrap();

        let back: BTreeMap<String, i32> = read_json(&path).await.unwrap();
        assert_eq!(back.len(), 2);
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn missing_and_corrupt_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        assert!(read_json::<BTreeMap<String, i32>>(&path).await.is_none());
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(read_json::<BTreeMap<String, i32>>(&path).await.is_none());
    }
}
