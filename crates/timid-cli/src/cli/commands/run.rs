//! `timid run` – transfer new items from a manifest.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use timid_core::config::TimidConfig;
use timid_core::control::RunControl;
use timid_core::media::MediaClass;
use timid_core::observer::ByteCounter;
use timid_core::pipeline::Pipeline;
use timid_core::progress::ProgressStore;
use timid_core::source::HttpManifestSource;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_transfer(
    cfg: TimidConfig,
    manifest_url: &str,
    dest: &Path,
    classes: &[MediaClass],
    state_dir: &Path,
) -> Result<()> {
    let source = HttpManifestSource::new(manifest_url, dest).context("manifest source")?;
    let store = Arc::new(ProgressStore::open(state_dir, cfg.dedup_capacity).await);
    tracing::info!(
        source = manifest_url,
        dest = %dest.display(),
        state = %state_dir.display(),
        "run starting"
    );

    let control = Arc::new(RunControl::new());
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nstopping: waiting for in-flight transfers (Ctrl-C again to abort)");
                control.request_stop();
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            }
        });
    }

    let counter = Arc::new(ByteCounter::new());
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let printer = tokio::spawn(print_progress(Arc::clone(&counter), classes.to_vec(), done_rx));

    let reports = Pipeline::new(Arc::new(source), store, cfg)
        .with_observer(counter)
        .with_control(Arc::clone(&control))
        .run(classes)
        .await;

    let _ = done_tx.send(());
    let _ = printer.await;

    for r in &reports {
        println!("{}", r);
    }
    if control.is_stopped() {
        println!("Stopped early; run again to continue.");
    }
    if let Some(fatal) = reports.iter().find_map(|r| r.fatal.as_deref()) {
        anyhow::bail!("{}", fatal);
    }
    Ok(())
}

async fn print_progress(
    counter: Arc<ByteCounter>,
    classes: Vec<MediaClass>,
    mut done: tokio::sync::oneshot::Receiver<()>,
) {
    let mut tick = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
    loop {
        tokio::select! {
            _ = &mut done => break,
            _ = tick.tick() => {
                let line: Vec<String> = classes
                    .iter()
                    .map(|&c| {
                        let s = counter.snapshot(c);
                        format!(
                            "{}: {} done, {:.1} MiB ({:.2} MiB/s)",
                            c,
                            s.items_done,
                            s.bytes_done as f64 / 1_048_576.0,
                            s.bytes_per_sec() / 1_048_576.0
                        )
                    })
                    .collect();
                print!("\r  {}  ", line.join("  "));
                let _ = std::io::stdout().flush();
            }
        }
    }
    println!();
}
