use std::time::Duration;

use crate::config::RetryConfig;

use super::classify::ErrorKind;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
    /// Honour the cooldown, then give up on this attempt.
    CooldownThenStop(Duration),
}

/// Exponential backoff for transient errors plus a bounded rate-limit budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts for transient errors (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
    /// Added to every service-announced cooldown.
    pub rate_limit_grace: Duration,
    /// How many cooldowns may be followed by another attempt. 0 means the
    /// first rate-limit signal ends the attempt after its cooldown.
    pub rate_limit_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
            rate_limit_grace: Duration::from_secs(cfg.rate_limit_grace_secs),
            rate_limit_retries: cfg.rate_limit_retries,
        }
    }

    /// `attempt` is 1-based and counts transient attempts; `cooldowns` is the
    /// number of rate-limit cooldowns already served for this operation.
    pub fn decide(&self, attempt: u32, cooldowns: u32, kind: ErrorKind) -> RetryDecision {
        match kind {
            ErrorKind::Fatal => RetryDecision::NoRetry,
            ErrorKind::RateLimited(wait) => {
                let cooldown = wait.saturating_add(self.rate_limit_grace);
                if cooldowns < self.rate_limit_retries {
                    RetryDecision::RetryAfter(cooldown)
                } else {
                    RetryDecision::CooldownThenStop(cooldown)
                }
            }
            ErrorKind::Transient => {
                if attempt >= self.max_attempts {
                    return RetryDecision::NoRetry;
                }
                // base * 2^(attempt-1), capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_retry_for_fatal() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, 0, ErrorKind::Fatal), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 20;
        let delay = |attempt| match p.decide(attempt, 0, ErrorKind::Transient) {
            RetryDecision::RetryAfter(d) => d,
            other => panic!("expected retry, got {:?}", other),
        };
        assert!(delay(2) >= delay(1));
        assert!(delay(15) <= p.max_delay);
    }

    #[test]
    fn respects_max_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert!(matches!(p.decide(1, 0, ErrorKind::Transient), RetryDecision::RetryAfter(_)));
        assert!(matches!(p.decide(2, 0, ErrorKind::Transient), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(3, 0, ErrorKind::Transient), RetryDecision::NoRetry);
    }

    #[test]
    fn rate_limit_adds_grace_and_stops_by_default() {
        let p = RetryPolicy::default();
        assert_eq!(p.rate_limit_retries, 0);
        assert_eq!(
            p.decide(1, 0, ErrorKind::RateLimited(Duration::from_secs(30))),
            RetryDecision::CooldownThenStop(Duration::from_secs(35))
        );
    }

    #[test]
    fn rate_limit_retries_are_bounded() {
        let mut p = RetryPolicy::default();
        p.rate_limit_retries = 2;
        let wait = ErrorKind::RateLimited(Duration::from_secs(10));
        assert_eq!(p.decide(1, 0, wait), RetryDecision::RetryAfter(Duration::from_secs(15)));
        assert_eq!(p.decide(1, 1, wait), RetryDecision::RetryAfter(Duration::from_secs(15)));
        assert_eq!(p.decide(1, 2, wait), RetryDecision::CooldownThenStop(Duration::from_secs(15)));
    }
}
