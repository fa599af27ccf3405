//! Client configuration.

use serde::{Deserialize, Serialize};

// ============================================================================
// DEFAULT FUNCTIONS
// ============================================================================

fn default_batch_size() -> usize {
    256
}

fn default_parallelism() -> usize {
    10
}

// ============================================================================
// MEMCACHED CONFIG
// ============================================================================

/// Configuration for a [`Memcached`](crate::client::Memcached) client.
///
/// Mirrors the `<prefix>memcached.{expiration,batchsize,parallelism}` knobs
/// of the query engine's configuration surface. Immutable once the client is
/// constructed.
///
/// Batching is disabled entirely when either `batch_size` or `parallelism`
/// is zero; `fetch` then degenerates to a single multi-get with no worker
/// pool involvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemcachedConfig {
    /// How long stored keys live, in seconds. Zero leaves expiry to the
    /// cache default.
    #[serde(default)]
    pub expiration_secs: u32,

    /// How many keys to fetch in each batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of concurrent multi-get requests to the cache,
    /// across all concurrent fetches.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self {
            expiration_secs: 0,
            batch_size: default_batch_size(),
            parallelism: default_parallelism(),
        }
    }
}

impl MemcachedConfig {
    /// True when the batched pipeline (dispatcher, worker pool, collector)
    /// is in play.
    #[must_use]
    pub fn batching_enabled(&self) -> bool {
        self.batch_size > 0 && self.parallelism > 0
    }
}
