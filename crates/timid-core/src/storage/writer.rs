//! Sequential writer for a `.part` file that is renamed into place on success.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Writer for a temp download file. Dropping it without `finalize` leaves the
/// `.part` file behind; call `discard` on failure paths.
pub struct PartFile {
    file: File,
    temp_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (or truncate) the temp file at `temp_path`, creating parent dirs.
    pub async fn create(temp_path: &Path) -> io::Result<Self> {
        if let Some(parent) = temp_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(temp_path).await?;
        Ok(PartFile {
            file,
            temp_path: temp_path.to_path_buf(),
            written: 0,
        })
    }

    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Append the whole content of `path` and return its length.
    pub async fn append_file(&mut self, path: &Path) -> io::Result<u64> {
        let mut src = File::open(path).await?;
        let n = tokio::io::copy(&mut src, &mut self.file).await?;
        self.written += n;
        Ok(n)
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush and sync file data to disk.
    pub async fn sync(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_all().await
    }

    /// Sync, close and atomically rename the temp file to `final_path`.
    /// Fails if `final_path` is on a different filesystem.
    pub async fn finalize(mut self, final_path: &Path) -> io::Result<u64> {
        self.sync().await?;
        let PartFile {
            file,
            temp_path,
            written,
        } = self;
        drop(file);
        tokio::fs::rename(&temp_path, final_path).await?;
        Ok(written)
    }

    /// Close and delete the temp file.
    pub async fn discard(self) -> io::Result<()> {
        let PartFile { file, temp_path, .. } = self;
        drop(file);
        super::remove_if_exists(&temp_path).await
    }
}
