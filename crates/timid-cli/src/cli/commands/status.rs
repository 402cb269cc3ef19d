//! `timid status` – show saved progress per media class.

use anyhow::Result;
use std::path::Path;
use timid_core::config::TimidConfig;
use timid_core::media::MediaClass;
use timid_core::progress::ProgressStore;

pub async fn run_status(cfg: &TimidConfig, manifest_url: &str, state_dir: &Path) -> Result<()> {
    let store = ProgressStore::open(state_dir, cfg.dedup_capacity).await;
    println!("Source: {}", manifest_url);
    println!("State:  {}", state_dir.display());
    println!(
        "{:<7} {:<12} {:<12} {:<12} {}",
        "CLASS", "LAST SEQ", "RESUME AFTER", "WINDOW", "FILE"
    );
    for class in MediaClass::ALL {
        let record = store.load(class).await;
        let path = store.path_for(class);
        let file = if path.exists() {
            path.display().to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{:<7} {:<12} {:<12} {:<12} {}",
            class,
            record.last_sequence_id,
            record.resume_after(),
            format!("{}/{}", record.recent_completed_ids.len(), record.capacity),
            file
        );
    }
    Ok(())
}
