//! Classify transfer errors into retry policy error kinds.

use std::time::Duration;

use crate::error::TransferError;
use crate::source::SourceError;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Service said "retry after" this long (before grace).
    RateLimited(Duration),
    /// Network hiccup, 5xx, short read: worth another attempt.
    Transient,
    /// Retrying cannot help (4xx, disk failure, unreachable source).
    Fatal,
}

/// Classify an HTTP status code reported by a source.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        408 | 500..=599 => ErrorKind::Transient,
        _ => ErrorKind::Fatal,
    }
}

/// Classify a transfer error. Chunk failures classify as their root cause.
pub fn classify(e: &TransferError) -> ErrorKind {
    match e.root() {
        TransferError::RateLimited { wait_secs } => {
            ErrorKind::RateLimited(Duration::from_secs(*wait_secs))
        }
        TransferError::Source(src) => match src {
            SourceError::Http(code) => classify_http_status(*code),
            SourceError::Network(_) => ErrorKind::Transient,
            SourceError::Malformed(_) | SourceError::Unavailable(_) | SourceError::RangeIgnored => {
                ErrorKind::Fatal
            }
            SourceError::RateLimited { wait_secs } => {
                ErrorKind::RateLimited(Duration::from_secs(*wait_secs))
            }
            SourceError::Io(_) => ErrorKind::Fatal,
        },
        TransferError::ShortTransfer { .. } => ErrorKind::Transient,
        TransferError::Storage(_)
        | TransferError::Persistence(_)
        | TransferError::FatalSource(_)
        | TransferError::PartialChunk { .. } => ErrorKind::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_5xx_and_408_transient() {
        assert_eq!(classify_http_status(500), ErrorKind::Transient);
        assert_eq!(classify_http_status(502), ErrorKind::Transient);
        assert_eq!(classify_http_status(408), ErrorKind::Transient);
    }

    #[test]
    fn http_4xx_fatal() {
        assert_eq!(classify_http_status(404), ErrorKind::Fatal);
        assert_eq!(classify_http_status(403), ErrorKind::Fatal);
    }

    #[test]
    fn rate_limit_carries_wait() {
        let e = TransferError::RateLimited { wait_secs: 30 };
        assert_eq!(classify(&e), ErrorKind::RateLimited(Duration::from_secs(30)));
    }

    #[test]
    fn short_transfer_is_transient_and_storage_fatal() {
        let short = TransferError::ShortTransfer { expected: 10, received: 4 };
        assert_eq!(classify(&short), ErrorKind::Transient);
        let disk = TransferError::Storage(std::io::Error::new(std::io::ErrorKind::Other, "full"));
        assert_eq!(classify(&disk), ErrorKind::Fatal);
    }

    #[test]
    fn chunk_failure_uses_root_cause() {
        let e = TransferError::PartialChunk {
            index: 1,
            count: 8,
            source: Box::new(TransferError::Source(SourceError::Network("reset".into()))),
        };
        assert_eq!(classify(&e), ErrorKind::Transient);
    }
}
