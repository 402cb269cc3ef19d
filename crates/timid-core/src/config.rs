use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::media::MediaClass;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per item or chunk on transient errors (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// Seconds added to every service-announced rate-limit wait.
    pub rate_limit_grace_secs: u64,
    /// Attempts allowed after a rate-limit cooldown. 0 = cool down, then
    /// abandon the item for this run.
    pub rate_limit_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
            rate_limit_grace_secs: 5,
            rate_limit_retries: 0,
        }
    }
}

/// How video items are transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStrategy {
    /// Split into `chunk_count` ranged reads fetched in parallel.
    #[default]
    Chunked,
    /// One stream per item, like images.
    Single,
}

/// Whether the two media classes run one after another or side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phasing {
    /// All images, then all videos.
    #[default]
    Sequential,
    /// Both class passes at once (slot pools stay independent).
    Interleaved,
}

/// Global configuration loaded from `~/.config/timid/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimidConfig {
    /// Concurrent image transfers.
    pub image_concurrency: usize,
    /// Concurrent whole-video transfers (each fans out to `chunk_count` reads).
    pub video_concurrency: usize,
    /// Ranged reads per chunked video.
    pub chunk_count: usize,
    /// Videos smaller than this go single-stream.
    pub chunk_min_bytes: u64,
    /// Size of the per-class dedup window.
    pub dedup_capacity: usize,
    pub video_strategy: VideoStrategy,
    pub phasing: Phasing,
    pub retry: RetryConfig,
}

impl Default for TimidConfig {
    fn default() -> Self {
        Self {
            image_concurrency: 10,
            video_concurrency: 4,
            chunk_count: 8,
            chunk_min_bytes: 1024 * 1024,
            dedup_capacity: 1000,
            video_strategy: VideoStrategy::Chunked,
            phasing: Phasing::Sequential,
            retry: RetryConfig::default(),
        }
    }
}

impl TimidConfig {
    /// Slot capacity for a media class (at least 1).
    pub fn concurrency_for(&self, class: MediaClass) -> usize {
        match class {
            MediaClass::Image => self.image_concurrency,
            MediaClass::Video => self.video_concurrency,
        }
        .max(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("timid")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TimidConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TimidConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TimidConfig = toml::from_str(&data)?;
    Ok(cfg)
}
