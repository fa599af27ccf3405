//! Batched memcached-style cache client.
//!
//! # Architecture
//!
//! ```text
//!  fetch(ctx, keys)
//!      │
//!      ▼
//!  dispatcher ───► shared input queue ───► worker (× parallelism)
//!  (per fetch)       (process-wide)             │ get_multi
//!      │                                        ▼
//!      └────────── collector ◄──── per-fetch result channel
//!                      │
//!                      ▼
//!         slots[batch_id] → ordered concatenation
//! ```
//!
//! The input queue is shared by every concurrent fetch, so the pool's
//! `parallelism` bounds outstanding multi-gets process-wide; dispatchers
//! block on the queue when the pool is saturated, and that backpressure is
//! the only admission control. Result channels are per-fetch, which keeps
//! fan-in private and lets each collector size its slot array exactly.
//!
//! # Shutdown
//!
//! Shutdown is driven by a one-shot latch with two triggers: an explicit
//! [`Memcached::stop`], or a dispatcher observing its caller's cancellation.
//! Firing the latch closes the input queue (workers finish their in-flight
//! batch and drain) and then broadcasts a stopped signal that wakes every
//! dispatcher and collector parked on a select. Workers race result
//! hand-off against that signal so they never strand on a fetch that
//! already gave up.

mod core;
mod fetch;
mod work;
mod worker;


pub use self::core::Memcached;
