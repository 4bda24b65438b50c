//! Batching relay scheduler
//!
//! The single loop between the record queue and the downstream sink. It
//! suspends on "next of {record arrives, ticker fires, queue closed, drain
//! requested}" - no busy waiting - and guarantees the final partial batch is
//! flushed exactly once before it reports completion.

use std::sync::Arc;
use std::time::Duration;

use relay_protocol::{LogRecord, BATCH_SIZE};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics::{RelayMetrics, RelaySnapshot};
use crate::sink::IngestSink;

/// Default interval between time-triggered flushes
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduler tunables
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Flush as soon as a batch reaches this many records
    pub batch_size: usize,

    /// Flush a non-empty batch at least this often
    pub flush_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// Single-consumer batching loop over the record queue
///
/// # Termination
///
/// The loop ends when:
/// - the queue closes (every producer sender dropped): final batch flushed,
///   normal completion;
/// - the sink reports [`NotRunning`](crate::SinkError::NotRunning): nothing
///   further can be delivered, so batching stops;
/// - the drain token fires (shutdown timed out waiting for listeners):
///   whatever is already queued is drained and flushed once, then the loop
///   exits even though stuck producers still hold senders.
pub struct RelayScheduler {
    sink: Arc<dyn IngestSink>,
    config: SchedulerConfig,
    metrics: Arc<RelayMetrics>,
}

impl RelayScheduler {
    /// Create a scheduler flushing to `sink`
    pub fn new(sink: Arc<dyn IngestSink>, config: SchedulerConfig) -> Self {
        Self {
            sink,
            config,
            metrics: Arc::new(RelayMetrics::new()),
        }
    }

    /// Get metrics reference; stays valid after `run` consumes the scheduler
    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run until the queue closes, the sink dies, or a drain is forced
    ///
    /// Returns the final metrics snapshot.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<LogRecord>,
        drain: CancellationToken,
    ) -> RelaySnapshot {
        tracing::info!(
            batch_size = self.config.batch_size,
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            "relay scheduler starting"
        );

        let mut batch: Vec<LogRecord> = Vec::with_capacity(self.config.batch_size);
        let mut ticker = interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(record) => {
                        self.metrics.record_received();
                        batch.push(record);
                        if batch.len() >= self.config.batch_size
                            && !self.flush(&mut batch).await
                        {
                            break;
                        }
                    }
                    None => {
                        // Queue closed: no more records will ever arrive.
                        self.flush(&mut batch).await;
                        break;
                    }
                },

                _ = ticker.tick() => {
                    // An empty batch produces no downstream call.
                    if !batch.is_empty() && !self.flush(&mut batch).await {
                        break;
                    }
                }

                _ = drain.cancelled() => {
                    self.drain_remaining(&mut rx, &mut batch).await;
                    break;
                }
            }
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            records = snapshot.records_received,
            batches_flushed = snapshot.batches_flushed,
            batches_dropped = snapshot.batches_dropped,
            "relay scheduler stopped"
        );
        snapshot
    }

    /// Forced-drain path: take what is already queued, flush, and stop
    async fn drain_remaining(
        &self,
        rx: &mut mpsc::Receiver<LogRecord>,
        batch: &mut Vec<LogRecord>,
    ) {
        while let Ok(record) = rx.try_recv() {
            self.metrics.record_received();
            batch.push(record);
            if batch.len() >= self.config.batch_size && !self.flush(batch).await {
                return;
            }
        }
        self.flush(batch).await;
    }

    /// Flush the accumulated batch as one atomic submit call
    ///
    /// Returns false when the sink reported it is not running and the loop
    /// must stop; transient failures drop the batch and return true.
    async fn flush(&self, batch: &mut Vec<LogRecord>) -> bool {
        if batch.is_empty() {
            return true;
        }

        let records = std::mem::take(batch);
        let count = records.len() as u64;

        match self.sink.submit(records).await {
            Ok(()) => {
                self.metrics.record_flush(count);
                true
            }
            Err(e) if e.is_not_running() => {
                self.metrics.record_drop(count);
                tracing::error!("sink is not running, stopping relay");
                false
            }
            Err(e) => {
                self.metrics.record_drop(count);
                tracing::warn!(error = %e, dropped = count, "batch flush failed");
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
