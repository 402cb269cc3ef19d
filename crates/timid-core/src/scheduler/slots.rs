//! Per-class transfer slots.
//!
//! Each media class owns a semaphore sized from config. A driver reserves a
//! slot before spawning a transfer task and the task holds the permit until it
//! returns, so releasing one slot admits exactly one queued transfer.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::TimidConfig;
use crate::media::MediaClass;

/// Two independent slot pools (Image, Video). Admission in one class never
/// waits on the other.
#[derive(Debug)]
pub struct SlotPool {
    image: Arc<Semaphore>,
    video: Arc<Semaphore>,
    image_capacity: usize,
    video_capacity: usize,
}

impl SlotPool {
    /// Create pools with the given capacities (each at least 1).
    pub fn new(image_capacity: usize, video_capacity: usize) -> Self {
        let image_capacity = image_capacity.max(1);
        let video_capacity = video_capacity.max(1);
        Self {
            image: Arc::new(Semaphore::new(image_capacity)),
            video: Arc::new(Semaphore::new(video_capacity)),
            image_capacity,
            video_capacity,
        }
    }

    pub fn from_config(cfg: &TimidConfig) -> Self {
        Self::new(
            cfg.concurrency_for(MediaClass::Image),
            cfg.concurrency_for(MediaClass::Video),
        )
    }

    fn semaphore(&self, class: MediaClass) -> &Arc<Semaphore> {
        match class {
            MediaClass::Image => &self.image,
            MediaClass::Video => &self.video,
        }
    }

    pub fn capacity(&self, class: MediaClass) -> usize {
        match class {
            MediaClass::Image => self.image_capacity,
            MediaClass::Video => self.video_capacity,
        }
    }

    /// Free slots right now.
    fn available(&self, class: MediaClass) -> usize {
        self.semaphore(class).available_permits()
    }

    /// Slots currently held.
    pub fn in_use(&self, class: MediaClass) -> usize {
        self.capacity(class).saturating_sub(self.available(class))
    }

    /// Wait for a free slot in `class`. `None` if the semaphore was closed.
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(&self, class: MediaClass) -> Option<SlotPermit> {
        let permit = Arc::clone(self.semaphore(class)).acquire_owned().await.ok()?;
        Some(SlotPermit {
            class,
            _permit: permit,
        })
    }
}

/// Releases one slot of its class when dropped.
#[derive(Debug)]
pub struct SlotPermit {
    class: MediaClass,
    _permit: OwnedSemaphorePermit,
}

impl SlotPermit {
    pub fn class(&self) -> MediaClass {
        self.class
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        tracing::trace!(class = %self.class, "slot released");
    }
}
