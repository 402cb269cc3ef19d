//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;

use crate::error::TransferError;

use super::classify::{classify, ErrorKind};
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds or the retry policy says to stop. Sleeps for
/// backoff and rate-limit cooldowns in between; the cooldown is served even
/// when no further attempt follows, so the caller's next request is delayed.
/// `label` identifies the item (and chunk) in log lines.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, TransferError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    let mut attempt = 1u32;
    let mut cooldowns = 0u32;
    loop {
        let err = match op().await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let kind = classify(&err);
        match policy.decide(attempt, cooldowns, kind) {
            RetryDecision::NoRetry => return Err(err),
            RetryDecision::RetryAfter(d) => {
                if let ErrorKind::RateLimited(_) = kind {
                    tracing::warn!(item = label, wait_secs = d.as_secs(), "rate limited, cooling down before retry");
                    cooldowns += 1;
                } else {
                    tracing::debug!(item = label, attempt, delay_ms = d.as_millis() as u64, error = %err, "transient failure, retrying");
                    attempt += 1;
                }
                tokio::time::sleep(d).await;
            }
            RetryDecision::CooldownThenStop(d) => {
                tracing::warn!(item = label, wait_secs = d.as_secs(), "rate limited, cooling down and abandoning attempt");
                tokio::time::sleep(d).await;
                return Err(err);
            }
        }
    }
}
