//! Concurrency scheduler.
//!
//! Caps in-flight transfers per media class (Image and Video pools are sized
//! independently) and admits new work as slots free.

mod slots;

pub use slots::{SlotPermit, SlotPool};
