#![allow(dead_code)]

pub mod manifest_server;
pub mod memory_source;

use std::path::Path;
use std::sync::Arc;

use timid_core::config::{RetryConfig, TimidConfig};
use timid_core::progress::ProgressStore;

/// Config with fast retries and chunking enabled for any non-empty video.
pub fn test_config() -> TimidConfig {
    TimidConfig {
        chunk_min_bytes: 1,
        retry: RetryConfig {
            base_delay_secs: 0.001,
            max_delay_secs: 1,
            ..RetryConfig::default()
        },
        ..TimidConfig::default()
    }
}

pub async fn open_store(dir: &Path) -> Arc<ProgressStore> {
    Arc::new(ProgressStore::open(dir, 1000).await)
}

/// Every file under `dir`, recursively.
pub fn files_under(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for e in entries.flatten() {
            let p = e.path();
            if p.is_dir() {
                out.extend(files_under(&p));
            } else {
                out.push(p);
            }
        }
    }
    out
}
