//! Work items flowing between dispatcher, workers, and collector.

use std::ops::Range;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::CacheError;

/// One batch of keys enqueued on the shared input channel.
///
/// `batch_id` is assigned by the dispatcher in input order and is the sole
/// carrier of result ordering through fan-in. The key slice is shared with
/// every other batch of the same fetch; `range` selects this batch's window.
pub(super) struct Work {
    pub(super) keys: Arc<[String]>,
    pub(super) range: Range<usize>,
    pub(super) batch_id: usize,
    /// Per-fetch fan-in channel the collector reads from.
    pub(super) result_tx: mpsc::Sender<BatchResult>,
}

impl Work {
    /// This batch's window of the fetch's key list.
    pub(super) fn keys(&self) -> &[String] {
        &self.keys[self.range.clone()]
    }
}

/// What a worker produced for one batch.
///
/// `found`/`bufs`/`missed` preserve the batch's input key order, so the
/// collector only has to concatenate slots in ascending `batch_id`.
#[derive(Debug)]
pub(super) struct BatchResult {
    pub(super) batch_id: usize,
    pub(super) found: Vec<String>,
    pub(super) bufs: Vec<Vec<u8>>,
    pub(super) missed: Vec<String>,
    pub(super) error: Option<CacheError>,
}
