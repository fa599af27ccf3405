//! Error types for the cache layer.

use thiserror::Error;

use crate::transport::TransportError;
use crate::types::FetchResult;

/// Convenience alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failures surfaced by the batched client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The pipeline aborted because [`Memcached::stop`](crate::client::Memcached::stop)
    /// was called.
    #[error("cache is stopped by client")]
    StoppedByClient,

    /// The caller's cancellation scope fired mid-fetch.
    #[error("fetch cancelled by caller")]
    Cancelled,

    /// The transport reported an error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A failed fetch, carrying partial data from the batches that completed.
///
/// On partial failure (some batches succeed, some error) the succeeded
/// batches' keys and values are still returned in request order via
/// `partial`; `source` is the last error observed.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FetchError {
    /// Data from batches that completed before the failure.
    pub partial: FetchResult,
    /// The error that failed the fetch.
    #[source]
    pub source: CacheError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_sentinel_message_is_stable() {
        // Callers match on this string in logs and alerts.
        assert_eq!(
            CacheError::StoppedByClient.to_string(),
            "cache is stopped by client"
        );
    }

    #[test]
    fn transport_errors_pass_through_display() {
        let err = CacheError::from(TransportError::Other("connection refused".into()));
        assert_eq!(err.to_string(), "memcache: connection refused");
    }

    #[test]
    fn fetch_error_exposes_source_and_partial() {
        let err = FetchError {
            partial: FetchResult {
                found: vec!["a".into()],
                bufs: vec![b"1".to_vec()],
                missed: vec![],
            },
            source: CacheError::Cancelled,
        };
        assert_eq!(err.to_string(), "fetch cancelled by caller");
        assert_eq!(err.partial.found, vec!["a".to_string()]);
        assert!(std::error::Error::source(&err).is_some());
    }
}
