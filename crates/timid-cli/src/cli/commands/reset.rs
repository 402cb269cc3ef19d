//! `timid reset` – forget saved progress. Downloaded files stay on disk, so
//! the next run still skips them via the destination check.

use anyhow::{Context, Result};
use std::path::Path;
use timid_core::config::TimidConfig;
use timid_core::media::MediaClass;
use timid_core::progress::ProgressStore;

pub async fn run_reset(cfg: &TimidConfig, state_dir: &Path, classes: &[MediaClass]) -> Result<()> {
    let store = ProgressStore::open(state_dir, cfg.dedup_capacity).await;
    for &class in classes {
        store
            .reset(class)
            .await
            .with_context(|| format!("reset {} progress", class))?;
        tracing::info!(%class, state = %state_dir.display(), "progress reset");
        println!("Reset {} progress.", class);
    }
    Ok(())
}
