//! Pipeline driver.
//!
//! Pulls items from the source in order, one pass per media class, and routes
//! each through dedup, slot admission, the fetcher and the progress store.
//! Each pass resumes from its class's watermark and ends once the listing is
//! exhausted (or fails, or a stop is requested) and every in-flight transfer
//! has resolved.

mod item;
mod pass;
mod report;
mod state;

use futures::future::join_all;
use std::sync::Arc;

use crate::config::{Phasing, TimidConfig};
use crate::control::RunControl;
use crate::dedup::InFlight;
use crate::fetcher::Fetcher;
use crate::media::MediaClass;
use crate::observer::{NoopObserver, TransferObserver};
use crate::progress::ProgressStore;
use crate::retry::RetryPolicy;
use crate::scheduler::SlotPool;
use crate::source::MediaSource;

use item::ItemTask;
pub use report::ClassReport;
pub use state::DriverState;

pub struct Pipeline {
    source: Arc<dyn MediaSource>,
    store: Arc<ProgressStore>,
    config: Arc<TimidConfig>,
    slots: Arc<SlotPool>,
    observer: Arc<dyn TransferObserver>,
    control: Arc<RunControl>,
    in_flight: Arc<InFlight>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn MediaSource>, store: Arc<ProgressStore>, config: TimidConfig) -> Self {
        let slots = Arc::new(SlotPool::from_config(&config));
        Self {
            source,
            store,
            config: Arc::new(config),
            slots,
            observer: Arc::new(NoopObserver),
            control: Arc::new(RunControl::new()),
            in_flight: Arc::new(InFlight::new()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Share a stop token with the caller (e.g. a Ctrl-C handler).
    pub fn with_control(mut self, control: Arc<RunControl>) -> Self {
        self.control = control;
        self
    }

    /// Run one pass per class in `classes`, one after another or side by side
    /// per the configured phasing. A stop request skips passes not yet started.
    pub async fn run(&self, classes: &[MediaClass]) -> Vec<ClassReport> {
        match self.config.phasing {
            Phasing::Sequential => {
                let mut reports = Vec::with_capacity(classes.len());
                for &class in classes {
                    if self.control.is_stopped() {
                        break;
                    }
                    reports.push(self.run_class(class).await);
                }
                reports
            }
            Phasing::Interleaved => {
                join_all(classes.iter().map(|&class| self.run_class(class))).await
            }
        }
    }

    /// Images, then videos (or both at once when interleaved).
    pub async fn run_all(&self) -> Vec<ClassReport> {
        self.run(&MediaClass::ALL).await
    }

    fn item_task(&self) -> ItemTask {
        ItemTask {
            fetcher: Fetcher::new(
                Arc::clone(&self.source),
                RetryPolicy::from_config(&self.config.retry),
                Arc::clone(&self.observer),
            ),
            store: Arc::clone(&self.store),
            observer: Arc::clone(&self.observer),
            config: Arc::clone(&self.config),
        }
    }
}
