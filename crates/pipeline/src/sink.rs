//! Downstream sink contract
//!
//! The relay hands finished batches to an [`IngestSink`]. The production
//! sink is a multiplexed transport to one or more backend indexers; the
//! relay core only depends on this trait, so tests and development builds
//! substitute in-process sinks.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use relay_protocol::LogRecord;

/// Sink errors
///
/// `NotRunning` is a distinguished kind, not a sentinel instance: the
/// scheduler branches on it to decide whether further batching is pointless.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink is not accepting data and will not recover
    #[error("sink is not running")]
    NotRunning,

    /// I/O error talking to the sink
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Any other sink-specific failure
    #[error("{0}")]
    Other(String),
}

impl SinkError {
    /// Whether this error means the sink is gone for good
    #[inline]
    pub fn is_not_running(&self) -> bool {
        matches!(self, Self::NotRunning)
    }
}

/// Downstream ingestion sink
///
/// `submit` is the relay's only hot-path call: one atomic hand-off of a full
/// batch, in arrival order. The remaining methods are lifecycle hooks used
/// by the process bootstrap and shutdown paths; sinks without those concerns
/// keep the default no-op implementations.
#[async_trait]
pub trait IngestSink: Send + Sync {
    /// Deliver one batch; never partially applied
    async fn submit(&self, batch: Vec<LogRecord>) -> Result<(), SinkError>;

    /// Block until the sink can accept data, bounded by `timeout`
    async fn wait_until_ready(&self, _timeout: Duration) -> Result<(), SinkError> {
        Ok(())
    }

    /// Flush anything the sink has buffered, bounded by `timeout`
    async fn sync(&self, _timeout: Duration) -> Result<(), SinkError> {
        Ok(())
    }

    /// Release the sink's resources
    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
