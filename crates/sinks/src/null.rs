//! Null sink - discards all data
//!
//! Receives batches, updates counters, and drops the data. Useful for
//! benchmarking the ingestion path without downstream I/O and for routing
//! tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use relay_pipeline::{IngestSink, SinkError};
use relay_protocol::LogRecord;

/// Sink that counts and discards every batch
#[derive(Debug, Default)]
pub struct NullSink {
    batches: AtomicU64,
    records: AtomicU64,
    bytes: AtomicU64,
}

/// Point-in-time snapshot of null sink counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullSinkSnapshot {
    pub batches: u64,
    pub records: u64,
    pub bytes: u64,
}

impl NullSink {
    /// Create a new null sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Get snapshot of counters
    pub fn snapshot(&self) -> NullSinkSnapshot {
        NullSinkSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl IngestSink for NullSink {
    async fn submit(&self, batch: Vec<LogRecord>) -> Result<(), SinkError> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.bytes.fetch_add(
            batch.iter().map(|r| r.len() as u64).sum(),
            Ordering::Relaxed,
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let snapshot = self.snapshot();
        tracing::info!(
            batches = snapshot.batches,
            records = snapshot.records,
            bytes = snapshot.bytes,
            "null sink closed"
        );
        Ok(())
    }
}
