//! CLI command handlers, one file per command.

mod reset;
mod run;
mod status;

pub use reset::run_reset;
pub use run::run_transfer;
pub use status::run_status;
