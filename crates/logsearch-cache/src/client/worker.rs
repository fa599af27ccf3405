//! Long-lived pool workers.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::warn;

use crate::metrics::RequestDuration;
use crate::transport::MemcacheClient;

use super::fetch;
use super::work::{BatchResult, Work};

/// Worker loop: pull batches off the shared queue until it closes, run the
/// multi-get, and hand the result back to the owning fetch.
///
/// The result send is raced against the stopped signal. A dispatcher that
/// gave up mid-pipeline (cancellation or stop) may never read from its
/// result channel; without the race the worker would be stranded on the
/// send. An abandoned result is simply dropped.
pub(super) async fn worker_loop(
    transport: Arc<dyn MemcacheClient>,
    metrics: Arc<RequestDuration>,
    input_rx: Arc<Mutex<mpsc::Receiver<Work>>>,
    mut stopped_rx: watch::Receiver<bool>,
) {
    loop {
        // One worker at a time parks on the queue; the lock is released as
        // soon as a work item (or the closed queue) is observed.
        let work = { input_rx.lock().await.recv().await };
        let Some(work) = work else { break };

        let (fetched, error) =
            fetch::fetch_keys(transport.as_ref(), &metrics, work.keys()).await;
        if let Some(err) = &error {
            warn!(batch_id = work.batch_id, error = %err, "memcache multi-get failed");
        }
        let result = BatchResult {
            batch_id: work.batch_id,
            found: fetched.found,
            bufs: fetched.bufs,
            missed: fetched.missed,
            error,
        };

        tokio::select! {
            _ = stopped_rx.wait_for(|stopped| *stopped) => return,
            _ = work.result_tx.send(result) => {}
        }
    }
}
