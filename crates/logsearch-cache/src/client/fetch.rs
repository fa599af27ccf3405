//! Fetch paths: single-shot multi-get and the batched pipeline.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{CacheError, FetchError};
use crate::metrics::{Method, RequestDuration, StatusCode};
use crate::transport::MemcacheClient;
use crate::types::FetchResult;

use super::core::Memcached;
use super::work::{BatchResult, Work};

impl Memcached {
    /// Fetch `keys` from the cache.
    ///
    /// `found` is a subsequence of `keys` in request order, `bufs` is
    /// index-aligned with `found`, and `missed` holds the remaining keys in
    /// request order — regardless of how the fetch was split into batches.
    /// On partial failure the completed batches' data is carried by
    /// [`FetchError::partial`].
    ///
    /// `ctx` is the caller's cancellation scope. It is observed at batch
    /// boundaries only, so an in-flight multi-get always runs to completion;
    /// after cancellation the fetch returns [`CacheError::Cancelled`] with
    /// whatever batches finished first.
    pub async fn fetch(
        &self,
        ctx: &CancellationToken,
        keys: Vec<String>,
    ) -> Result<FetchResult, FetchError> {
        let Some(pool) = &self.pool else {
            // Batching disabled: one multi-get, no pool involvement.
            let (result, error) = fetch_keys(self.transport.as_ref(), &self.metrics, &keys).await;
            return into_result(result, error);
        };
        let pool = Arc::clone(pool);

        let start = Instant::now();
        let outcome = self.fetch_keys_batched(&pool, ctx, keys).await;
        let status = StatusCode::from_outcome(outcome.as_ref().err().map(|err| &err.source));
        self.metrics.observe_since(Method::GetBatched, status, start);
        outcome
    }

    /// The batched pipeline: dispatcher feeding the shared worker pool,
    /// collector recombining per-batch results into input order.
    async fn fetch_keys_batched(
        &self,
        pool: &Arc<super::core::WorkerPool>,
        ctx: &CancellationToken,
        keys: Vec<String>,
    ) -> Result<FetchResult, FetchError> {
        let keys: Arc<[String]> = keys.into();
        let num_batches = keys.len().div_ceil(self.cfg.batch_size);

        // Per-fetch fan-in channel. Kept at minimum capacity so a worker's
        // hand-off stays raced against shutdown instead of parking results
        // in a buffer nobody will read.
        let (result_tx, mut result_rx) = mpsc::channel::<BatchResult>(1);
        let dispatch_err: Arc<OnceLock<CacheError>> = Arc::new(OnceLock::new());

        self.spawn_dispatcher(pool, ctx, &keys, result_tx, &dispatch_err);

        // Exactly one slot per batch, indexed by batch id; the slot order is
        // what restores the caller's key order after fan-in.
        let mut slots: Vec<Option<BatchResult>> = Vec::with_capacity(num_batches);
        slots.resize_with(num_batches, || None);
        let mut stopped_rx = pool.stopped_rx();
        let mut received = 0usize;
        let mut aborted = false;
        while received < num_batches {
            tokio::select! {
                result = result_rx.recv() => match result {
                    Some(result) => {
                        let batch_id = result.batch_id;
                        slots[batch_id] = Some(result);
                        received += 1;
                    }
                    // Every sender is gone: the dispatcher exited early and
                    // the missing results will never arrive.
                    None => {
                        aborted = true;
                        break;
                    }
                },
                _ = stopped_rx.wait_for(|stopped| *stopped) => {
                    aborted = true;
                    break;
                }
            }
        }

        let mut out = FetchResult::default();
        let mut last_err = None;
        for slot in slots.into_iter().flatten() {
            out.found.extend(slot.found);
            out.bufs.extend(slot.bufs);
            out.missed.extend(slot.missed);
            if let Some(err) = slot.error {
                last_err = Some(err);
            }
        }

        if aborted {
            let source = dispatch_err
                .get()
                .cloned()
                .unwrap_or(CacheError::StoppedByClient);
            return Err(FetchError {
                partial: out,
                source,
            });
        }
        into_result(out, last_err)
    }

    /// Spawn the per-fetch dispatcher: chop the key list into windows and
    /// enqueue them on the shared input channel in input order.
    ///
    /// Each send races {cancellation, stopped, queue send} with that
    /// priority. On cancellation the dispatcher publishes the error and then
    /// tears the pool down; on stop it publishes the stop sentinel. The
    /// publish happens before the latch fires so the collector's wakeup
    /// observes it.
    fn spawn_dispatcher(
        &self,
        pool: &Arc<super::core::WorkerPool>,
        ctx: &CancellationToken,
        keys: &Arc<[String]>,
        result_tx: mpsc::Sender<BatchResult>,
        dispatch_err: &Arc<OnceLock<CacheError>>,
    ) {
        let pool = Arc::clone(pool);
        let ctx = ctx.clone();
        let keys = Arc::clone(keys);
        let dispatch_err = Arc::clone(dispatch_err);
        let batch_size = self.cfg.batch_size;
        #[cfg(test)]
        let gate = pool.dispatch_gate.lock().clone();

        tokio::spawn(async move {
            let Some(input_tx) = pool.sender() else {
                // Shutdown already began before this fetch dispatched.
                let _ = dispatch_err.set(CacheError::StoppedByClient);
                return;
            };
            let mut stopped_rx = pool.stopped_rx();
            let total = keys.len();

            for (batch_id, start) in (0..total).step_by(batch_size).enumerate() {
                let end = usize::min(start + batch_size, total);

                #[cfg(test)]
                if let Some(gate) = &gate {
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => {
                            let _ = dispatch_err.set(CacheError::Cancelled);
                            pool.close_and_stop();
                            return;
                        }
                        _ = stopped_rx.wait_for(|stopped| *stopped) => {
                            let _ = dispatch_err.set(CacheError::StoppedByClient);
                            return;
                        }
                        permit = gate.acquire() => match permit {
                            Ok(permit) => permit.forget(),
                            Err(_) => return,
                        },
                    }
                }

                let work = Work {
                    keys: Arc::clone(&keys),
                    range: start..end,
                    batch_id,
                    result_tx: result_tx.clone(),
                };
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        let _ = dispatch_err.set(CacheError::Cancelled);
                        pool.close_and_stop();
                        return;
                    }
                    _ = stopped_rx.wait_for(|stopped| *stopped) => {
                        let _ = dispatch_err.set(CacheError::StoppedByClient);
                        return;
                    }
                    sent = input_tx.send(work) => {
                        // A closed queue means shutdown won the race.
                        if sent.is_err() {
                            let _ = dispatch_err.set(CacheError::StoppedByClient);
                            return;
                        }
                    }
                }
            }
        });
    }
}

/// One multi-get for the whole slice: the degenerate single-batch fetch.
///
/// The response map is re-walked in the caller's key order, which is what
/// makes per-batch results concatenation-safe. On transport error the whole
/// batch is reported as missed so the caller can fall back to the origin.
pub(super) async fn fetch_keys(
    transport: &dyn MemcacheClient,
    metrics: &RequestDuration,
    keys: &[String],
) -> (FetchResult, Option<CacheError>) {
    let start = Instant::now();
    let response = transport.get_multi(keys).await;
    let error = response.as_ref().err().cloned().map(CacheError::from);
    metrics.observe_since(Method::GetMulti, StatusCode::from_outcome(error.as_ref()), start);

    match response {
        Err(_) => (
            FetchResult {
                found: Vec::new(),
                bufs: Vec::new(),
                missed: keys.to_vec(),
            },
            error,
        ),
        Ok(mut items) => {
            let mut out = FetchResult::default();
            for key in keys {
                match items.remove(key) {
                    Some(item) => {
                        out.found.push(key.clone());
                        out.bufs.push(item.value);
                    }
                    None => out.missed.push(key.clone()),
                }
            }
            (out, None)
        }
    }
}

fn into_result(
    result: FetchResult,
    error: Option<CacheError>,
) -> Result<FetchResult, FetchError> {
    match error {
        None => Ok(result),
        Some(source) => Err(FetchError {
            partial: result,
            source,
        }),
    }
}
