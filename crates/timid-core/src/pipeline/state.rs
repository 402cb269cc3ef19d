use std::fmt;

/// Where one class pass is. `Idle` before listing starts and after draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    /// Waiting on the source for the next item.
    Listing,
    /// Last item was a dedup hit.
    Skipping,
    /// Last item was handed to a transfer task.
    Transferring,
    /// Listing ended (exhausted, failed or stopped); waiting for in-flight tasks.
    Draining,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverState::Idle => "idle",
            DriverState::Listing => "listing",
            DriverState::Skipping => "skipping",
            DriverState::Transferring => "transferring",
            DriverState::Draining => "draining",
        })
    }
}
