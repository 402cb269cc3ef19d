//! Retry and backoff controller.
//!
//! Classifies transfer errors (rate limit, transient, fatal) and decides
//! whether to back off and retry, cool down and stop, or give up, so the
//! single-stream and chunked fetchers share one policy.

mod classify;
mod policy;
mod run;

pub use classify::{classify, ErrorKind};
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
