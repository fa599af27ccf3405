//! Transport contract for the remote cache.
//!
//! The batched client is built over a minimal multi-get/set interface so the
//! network layer (server selection, connection pooling, wire protocol) stays
//! injectable. Every worker shares one handle, so implementations must be
//! safe for concurrent use.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// One key/value/expiration triple as the transport stores it.
#[derive(Debug, Clone)]
pub struct Item {
    /// Cache key; must be free of whitespace and control bytes
    /// (see [`hash_key`](crate::keys::hash_key)).
    pub key: String,
    /// Opaque value bytes.
    pub value: Vec<u8>,
    /// Scoped lifetime in seconds; zero leaves expiry to the cache default.
    pub expiration_secs: u32,
}

/// Errors surfaced by a [`MemcacheClient`] implementation.
///
/// `CacheMiss` and `MalformedKey` are well-known only for status-code
/// mapping (see [`StatusCode`](crate::metrics::StatusCode)); the client
/// otherwise treats every variant as opaque and never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The requested key was not present.
    #[error("memcache: cache miss")]
    CacheMiss,

    /// The key is too long or contains bytes the server rejects.
    #[error("memcache: malformed key")]
    MalformedKey,

    /// Any other transport or protocol failure.
    #[error("memcache: {0}")]
    Other(String),
}

/// Multi-get/set contract the batched client is built over.
#[async_trait]
pub trait MemcacheClient: Send + Sync + 'static {
    /// Read many keys in one round-trip.
    ///
    /// The returned map contains only the keys that were present; order is
    /// not significant.
    async fn get_multi(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Item>, TransportError>;

    /// Write one item.
    async fn set(&self, item: Item) -> Result<(), TransportError>;
}
