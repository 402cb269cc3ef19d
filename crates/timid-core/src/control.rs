//! Run control: a shared stop token for Ctrl-C and embedding callers.
//!
//! The pipeline checks the token between items and while waiting for a slot.
//! Once set, no new item is admitted; in-flight transfers finish or abandon
//! on their own and the pass drains.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct RunControl {
    stop: AtomicBool,
    notify: Notify,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop admitting items. Idempotent.
    pub fn request_stop(&self) {
        if !self.stop.swap(true, Ordering::AcqRel) {
            tracing::info!("stop requested, draining in-flight transfers");
        }
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Resolves once a stop has been requested.
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}
