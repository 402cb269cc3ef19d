//! Errors reported by a media source.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The service asked us to wait before the next request.
    #[error("rate limited: retry after {wait_secs}s")]
    RateLimited { wait_secs: u64 },
    /// Non-success HTTP status (other than rate limiting).
    #[error("HTTP {0}")]
    Http(u32),
    /// Connection, DNS, timeout or read failure.
    #[error("network: {0}")]
    Network(String),
    /// A ranged request was answered with the whole body.
    #[error("source ignored byte range request")]
    RangeIgnored,
    /// The source cannot be reached or listed at all.
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// Listing response could not be understood.
    #[error("malformed listing: {0}")]
    Malformed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<curl::Error> for SourceError {
    fn from(e: curl::Error) -> Self {
        SourceError::Network(e.to_string())
    }
}
