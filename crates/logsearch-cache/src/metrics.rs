//! Lock-free request-duration metrics.
//!
//! Tracks one duration histogram per `{method, status_code}` pair using
//! atomic counters with relaxed ordering; exact consistency is not required
//! for statistical monitoring. The [`HistogramSnapshot`] API is the export
//! boundary — scrape plumbing lives with the process, not this crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::CacheError;
use crate::transport::TransportError;

/// Exported name of the request-duration histogram.
pub const REQUEST_DURATION_METRIC: &str = "logsearch_memcache_request_duration_seconds";

/// Histogram bucket upper bounds in seconds: exponential from 16µs through
/// 65.536ms (×4), extended with a sub-second tail. Observations above the
/// last bound land in an implicit +Inf bucket.
pub const BUCKET_BOUNDS: [f64; 11] = [
    0.000_016, 0.000_064, 0.000_256, 0.001_024, 0.004_096, 0.016_384, 0.065_536, 0.150, 0.250,
    0.500, 1.0,
];

// ============================================================================
// LABELS
// ============================================================================

/// RPC method label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// The batched fetch pipeline as a whole.
    GetBatched,
    /// One multi-get round-trip.
    GetMulti,
    /// One single-key set.
    Put,
}

impl Method {
    /// Every method label.
    pub const ALL: [Method; 3] = [Method::GetBatched, Method::GetMulti, Method::Put];

    /// The exported label value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetBatched => "Memcache.GetBatched",
            Method::GetMulti => "Memcache.GetMulti",
            Method::Put => "Memcache.Put",
        }
    }

    fn index(self) -> usize {
        match self {
            Method::GetBatched => 0,
            Method::GetMulti => 1,
            Method::Put => 2,
        }
    }
}

/// HTTP-style status label derived from an operation's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Success.
    Ok,
    /// The transport rejected a key as malformed.
    BadRequest,
    /// The transport reported a cache miss.
    NotFound,
    /// Any other failure.
    Internal,
}

impl StatusCode {
    /// Every status label.
    pub const ALL: [StatusCode; 4] = [
        StatusCode::Ok,
        StatusCode::BadRequest,
        StatusCode::NotFound,
        StatusCode::Internal,
    ];

    /// The exported label value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "200",
            StatusCode::BadRequest => "400",
            StatusCode::NotFound => "404",
            StatusCode::Internal => "500",
        }
    }

    /// Map an operation outcome to its status label.
    #[must_use]
    pub fn from_outcome(error: Option<&CacheError>) -> Self {
        match error {
            None => StatusCode::Ok,
            Some(CacheError::Transport(TransportError::CacheMiss)) => StatusCode::NotFound,
            Some(CacheError::Transport(TransportError::MalformedKey)) => StatusCode::BadRequest,
            Some(_) => StatusCode::Internal,
        }
    }

    fn index(self) -> usize {
        match self {
            StatusCode::Ok => 0,
            StatusCode::BadRequest => 1,
            StatusCode::NotFound => 2,
            StatusCode::Internal => 3,
        }
    }
}

// ============================================================================
// HISTOGRAM
// ============================================================================

/// One `{method, status_code}` series: per-bucket counters plus count/sum.
#[derive(Debug)]
struct Cell {
    /// Non-cumulative bucket counts; the last slot is the +Inf bucket.
    buckets: [AtomicU64; BUCKET_BOUNDS.len() + 1],
    count: AtomicU64,
    sum_nanos: AtomicU64,
}

impl Cell {
    fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            count: AtomicU64::new(0),
            sum_nanos: AtomicU64::new(0),
        }
    }

    fn observe(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        let idx = BUCKET_BOUNDS
            .iter()
            .position(|bound| secs <= *bound)
            .unwrap_or(BUCKET_BOUNDS.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }
}

/// Request-duration histogram for one client instance.
///
/// The client `name` is carried as a constant label so several cache
/// instances (chunk, query-fragment, index) can share one exporter.
#[derive(Debug)]
pub struct RequestDuration {
    name: String,
    cells: [[Cell; StatusCode::ALL.len()]; Method::ALL.len()],
}

impl RequestDuration {
    /// Create a histogram carrying `name` as its constant label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: std::array::from_fn(|_| std::array::from_fn(|_| Cell::new())),
        }
    }

    /// The constant `name` label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one observation.
    pub fn observe(&self, method: Method, status: StatusCode, elapsed: Duration) {
        self.cells[method.index()][status.index()].observe(elapsed);
    }

    /// Record one observation measured from `start`.
    pub fn observe_since(&self, method: Method, status: StatusCode, start: Instant) {
        self.observe(method, status, start.elapsed());
    }

    /// Point-in-time view of one `{method, status_code}` series.
    #[must_use]
    pub fn snapshot(&self, method: Method, status: StatusCode) -> HistogramSnapshot {
        let cell = &self.cells[method.index()][status.index()];
        let mut cumulative = 0;
        let mut buckets = Vec::with_capacity(BUCKET_BOUNDS.len());
        for (idx, bound) in BUCKET_BOUNDS.iter().enumerate() {
            cumulative += cell.buckets[idx].load(Ordering::Relaxed);
            buckets.push((*bound, cumulative));
        }
        HistogramSnapshot {
            count: cell.count.load(Ordering::Relaxed),
            sum_seconds: cell.sum_nanos.load(Ordering::Relaxed) as f64 / 1e9,
            buckets,
        }
    }
}

/// Point-in-time, export-ready view of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Total number of observations, including those above the last bound.
    pub count: u64,
    /// Sum of all observed durations in seconds.
    pub sum_seconds: f64,
    /// Cumulative (`le`-style) counts per bucket bound.
    pub buckets: Vec<(f64, u64)>,
}
