//! Relay scheduler metrics
//!
//! Atomic counters with relaxed ordering; values are eventually consistent
//! diagnostics, logged at shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the relay scheduler
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Records consumed from the queue
    records_received: AtomicU64,

    /// Batches delivered to the sink
    batches_flushed: AtomicU64,

    /// Records delivered to the sink
    records_flushed: AtomicU64,

    /// Batches dropped on transient flush failure
    batches_dropped: AtomicU64,

    /// Records lost with those batches
    records_dropped: AtomicU64,
}

impl RelayMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            records_flushed: AtomicU64::new(0),
            batches_dropped: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
        }
    }

    /// Record a batch handed to the sink
    #[inline]
    pub fn record_flush(&self, records: u64) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.records_flushed.fetch_add(records, Ordering::Relaxed);
    }

    /// Record a batch dropped after a flush failure
    #[inline]
    pub fn record_drop(&self, records: u64) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
        self.records_dropped.fetch_add(records, Ordering::Relaxed);
    }

    /// Record one record pulled off the queue
    #[inline]
    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of relay metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySnapshot {
    pub records_received: u64,
    pub batches_flushed: u64,
    pub records_flushed: u64,
    pub batches_dropped: u64,
    pub records_dropped: u64,
}
