//! Cache layer for the logsearch query engine.
//!
//! A batched, parallel, order-preserving memcached-style client used to
//! cache chunk payloads and query fragments. Values are opaque bytes; the
//! network transport is injected behind [`MemcacheClient`], and fetch
//! results always come back in the order the keys were requested, however
//! the fetch was split into batches.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use logsearch_cache::{CacheType, Memcached, MemcachedConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = Memcached::new(
//!     MemcachedConfig::default(),
//!     Arc::new(transport),
//!     "chunks",
//!     CacheType::Chunk,
//! );
//!
//! client.store(&keys, &bufs).await?;
//! let result = client.fetch(&CancellationToken::new(), keys).await?;
//! for (key, buf) in result.found.iter().zip(&result.bufs) {
//!     // cache hits, in request order
//! }
//! client.stop().await;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod transport;
pub mod types;

pub use client::Memcached;
pub use config::MemcachedConfig;
pub use error::{CacheError, CacheResult, FetchError};
pub use keys::hash_key;
pub use transport::{Item, MemcacheClient, TransportError};
pub use types::{CacheType, FetchResult};
