//! CLI for the TIMID media transfer engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use timid_core::config::{self, Phasing};
use timid_core::media::MediaClass;
use timid_core::progress;

use commands::{run_reset, run_status, run_transfer};

/// Top-level CLI for TIMID.
#[derive(Debug, Parser)]
#[command(name = "timid")]
#[command(about = "TIMID: resumable, bounded-concurrency media transfer engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Media class filter for `--only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassArg {
    Image,
    Video,
}

impl From<ClassArg> for MediaClass {
    fn from(c: ClassArg) -> Self {
        match c {
            ClassArg::Image => MediaClass::Image,
            ClassArg::Video => MediaClass::Video,
        }
    }
}

/// Classes selected by `--only` (both when absent, images first).
fn selected_classes(only: Option<ClassArg>) -> Vec<MediaClass> {
    match only {
        Some(c) => vec![c.into()],
        None => MediaClass::ALL.to_vec(),
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Transfer everything new from a manifest, resuming from saved progress.
    Run {
        /// Manifest URL (paginated JSON listing).
        manifest_url: String,
        /// Download directory (default: current directory). Images go to `<DIR>/img/`.
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
        /// Only transfer one media class.
        #[arg(long, value_enum)]
        only: Option<ClassArg>,
        /// Run the image and video passes side by side instead of one after another.
        #[arg(long)]
        interleave: bool,
        /// Directory for progress records (default: per-source XDG state dir).
        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },

    /// Show saved progress for a manifest.
    Status {
        /// Manifest URL.
        manifest_url: String,
        /// Directory for progress records (default: per-source XDG state dir).
        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },

    /// Forget saved progress for a manifest. Downloaded files are kept.
    Reset {
        /// Manifest URL.
        manifest_url: String,
        /// Only reset one media class.
        #[arg(long, value_enum)]
        only: Option<ClassArg>,
        /// Directory for progress records (default: per-source XDG state dir).
        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },
}

fn resolve_state_dir(manifest_url: &str, state_dir: Option<PathBuf>) -> Result<PathBuf> {
    match state_dir {
        Some(dir) => Ok(dir),
        None => progress::default_state_dir(manifest_url),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                manifest_url,
                dest,
                only,
                interleave,
                state_dir,
            } => {
                if interleave {
                    cfg.phasing = Phasing::Interleaved;
                }
                let dest = match dest {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                let state_dir = resolve_state_dir(&manifest_url, state_dir)?;
                run_transfer(cfg, &manifest_url, &dest, &selected_classes(only), &state_dir)
                    .await?;
            }
            CliCommand::Status {
                manifest_url,
                state_dir,
            } => {
                let state_dir = resolve_state_dir(&manifest_url, state_dir)?;
                run_status(&cfg, &manifest_url, &state_dir).await?;
            }
            CliCommand::Reset {
                manifest_url,
                only,
                state_dir,
            } => {
                let state_dir = resolve_state_dir(&manifest_url, state_dir)?;
                run_reset(&cfg, &state_dir, &selected_classes(only)).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
