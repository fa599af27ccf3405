//! Client facade and worker-pool lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::MemcachedConfig;
use crate::error::{CacheError, CacheResult};
use crate::metrics::{Method, RequestDuration, StatusCode};
use crate::transport::{Item, MemcacheClient};
use crate::types::CacheType;

use super::work::Work;
use super::worker;

/// Batched, parallel, order-preserving memcached-style cache client.
///
/// Fetches are split into `batch_size`-keyed windows, fanned out over a
/// bounded pool of `parallelism` worker tasks, and recombined so the caller
/// sees results in the order of the requested keys. The pool and its input
/// queue are shared by all concurrent fetches, which bounds the number of
/// outstanding multi-gets process-wide.
///
/// Construction spawns the workers, so the client must be created inside a
/// Tokio runtime. Dropping the client without calling [`Memcached::stop`]
/// closes the input queue and lets workers drain and exit on their own.
pub struct Memcached {
    pub(super) cfg: MemcachedConfig,
    pub(super) transport: Arc<dyn MemcacheClient>,
    pub(super) metrics: Arc<RequestDuration>,
    pub(super) pool: Option<Arc<WorkerPool>>,
    name: String,
    cache_type: CacheType,
}

/// State shared between the facade, dispatchers, and workers.
pub(super) struct WorkerPool {
    /// Shared work queue sender; taken (dropped) when shutdown begins.
    input_tx: Mutex<Option<mpsc::Sender<Work>>>,
    /// Broadcast "stopped" signal, flipped to `true` exactly once.
    stopped_tx: watch::Sender<bool>,
    /// One-shot latch guarding the queue close and the broadcast.
    stopping: AtomicBool,
    /// Worker handles, drained by `stop`.
    workers: AsyncMutex<Vec<JoinHandle<()>>>,
    /// Test-only rendezvous: the dispatcher takes one permit per batch.
    #[cfg(test)]
    pub(super) dispatch_gate: Mutex<Option<Arc<tokio::sync::Semaphore>>>,
}

impl WorkerPool {
    /// Begin shutdown. Idempotent and safe from any task.
    ///
    /// The queue is closed before the broadcast fires: workers finish their
    /// in-flight item and drain, while dispatchers and collectors parked on
    /// a select wake against the stopped signal.
    pub(super) fn close_and_stop(&self) {
        if self
            .stopping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("stopping memcached worker pool");
        self.input_tx.lock().take();
        let _ = self.stopped_tx.send(true);
    }

    /// A sender for the shared work queue, or `None` once shutdown began.
    pub(super) fn sender(&self) -> Option<mpsc::Sender<Work>> {
        self.input_tx.lock().clone()
    }

    /// Subscribe to the stopped signal.
    pub(super) fn stopped_rx(&self) -> watch::Receiver<bool> {
        self.stopped_tx.subscribe()
    }
}

impl Memcached {
    /// Create a new client over `transport`.
    ///
    /// When batching is enabled (`batch_size` and `parallelism` both
    /// positive), `parallelism` worker tasks are spawned and live until the
    /// input queue closes. Otherwise no pool exists and `fetch` issues a
    /// single multi-get.
    pub fn new(
        cfg: MemcachedConfig,
        transport: Arc<dyn MemcacheClient>,
        name: impl Into<String>,
        cache_type: CacheType,
    ) -> Self {
        let name = name.into();
        let metrics = Arc::new(RequestDuration::new(name.clone()));

        let pool = cfg.batching_enabled().then(|| {
            let (input_tx, input_rx) = mpsc::channel::<Work>(1);
            let (stopped_tx, _) = watch::channel(false);
            let input_rx = Arc::new(AsyncMutex::new(input_rx));

            let mut workers = Vec::with_capacity(cfg.parallelism);
            for _ in 0..cfg.parallelism {
                workers.push(tokio::spawn(worker::worker_loop(
                    Arc::clone(&transport),
                    Arc::clone(&metrics),
                    Arc::clone(&input_rx),
                    stopped_tx.subscribe(),
                )));
            }
            debug!(
                name = %name,
                parallelism = cfg.parallelism,
                batch_size = cfg.batch_size,
                "memcached worker pool started"
            );

            Arc::new(WorkerPool {
                input_tx: Mutex::new(Some(input_tx)),
                stopped_tx,
                stopping: AtomicBool::new(false),
                workers: AsyncMutex::new(workers),
                #[cfg(test)]
                dispatch_gate: Mutex::new(None),
            })
        });

        Self {
            cfg,
            transport,
            metrics,
            pool,
            name,
            cache_type,
        }
    }

    /// Store index-aligned key/value pairs with the configured expiration.
    ///
    /// Every pair is attempted even after a failure, so later keys still
    /// reach the cache; the last error seen is returned. A success return
    /// means the transport accepted every key; a failure return means at
    /// least one was rejected, without identifying which.
    pub async fn store(&self, keys: &[String], bufs: &[Vec<u8>]) -> CacheResult<()> {
        let mut last_err = None;
        for (key, buf) in keys.iter().zip(bufs) {
            let start = Instant::now();
            let result = self
                .transport
                .set(Item {
                    key: key.clone(),
                    value: buf.clone(),
                    expiration_secs: self.cfg.expiration_secs,
                })
                .await;
            let error = result.err().map(CacheError::from);
            self.metrics
                .observe_since(Method::Put, StatusCode::from_outcome(error.as_ref()), start);
            if let Some(err) = error {
                warn!(key = %key, error = %err, "memcache set failed");
                last_err = Some(err);
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Idempotent shutdown; returns once every worker has exited.
    ///
    /// Safe to call from any number of tasks, concurrently with in-flight
    /// fetches; those fetches return [`CacheError::StoppedByClient`]. With
    /// batching disabled this is a no-op.
    pub async fn stop(&self) {
        let Some(pool) = &self.pool else { return };
        pool.close_and_stop();
        let mut workers = pool.workers.lock().await;
        while let Some(handle) = workers.pop() {
            // A worker that panicked is already gone; nothing left to wait on.
            let _ = handle.await;
        }
    }

    /// The cache-type tag supplied at construction.
    #[must_use]
    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    /// The client name, also the metric `name` label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request-duration metrics for this client.
    #[must_use]
    pub fn metrics(&self) -> &RequestDuration {
        &self.metrics
    }

    /// Install a dispatch rendezvous so tests can interleave stop/cancel
    /// with batch dispatch deterministically. The dispatcher acquires one
    /// permit per batch before sending it to the pool.
    #[cfg(test)]
    pub(crate) fn set_test_dispatch_gate(&self, gate: Arc<tokio::sync::Semaphore>) {
        if let Some(pool) = &self.pool {
            *pool.dispatch_gate.lock() = Some(gate);
        }
    }
}
