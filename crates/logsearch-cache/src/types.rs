//! Shared types for the cache layer.

use serde::{Deserialize, Serialize};

/// Which class of query-engine data a cache instance holds.
///
/// Attached at construction and surfaced by
/// [`Memcached::cache_type`](crate::client::Memcached::cache_type) so the
/// query path can attribute hits and misses to the right cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// Chunk payload cache.
    Chunk,
    /// Query-fragment result cache.
    QueryFragment,
    /// Index lookup cache.
    Index,
}

impl CacheType {
    /// Stable snake_case name, used as a statistics label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Chunk => "chunk",
            CacheType::QueryFragment => "query_fragment",
            CacheType::Index => "index",
        }
    }
}

/// Outcome of a fetch.
///
/// `found` is a subsequence of the requested keys in request order, `bufs`
/// is index-aligned with `found`, and `missed` holds the remaining keys,
/// also in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    /// Keys present in the cache.
    pub found: Vec<String>,
    /// Values for `found`, index-aligned.
    pub bufs: Vec<Vec<u8>>,
    /// Keys absent from the cache.
    pub missed: Vec<String>,
}

impl FetchResult {
    /// True when the fetch produced neither hits nor misses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.missed.is_empty()
    }
}
