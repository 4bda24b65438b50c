//! Relay - Pipeline
//!
//! The single consumer side of the record queue: the [`RelayScheduler`]
//! drains records from the listeners, accumulates size- and time-bounded
//! batches, and flushes them to a downstream [`IngestSink`].
//!
//! # Key design
//!
//! - **One scheduler task** - the bounded `mpsc` record queue is the only
//!   synchronization between listeners and the scheduler
//! - **Two flush triggers** - batch reaches capacity, or the interval ticker
//!   fires with a non-empty batch
//! - **Ordered drain on shutdown** - when the queue closes the final partial
//!   batch is flushed exactly once before the scheduler reports completion
//! - **Sentinel error kind** - [`SinkError::NotRunning`] is the one condition
//!   that stops the scheduler; other flush failures drop the batch and keep
//!   the loop alive (at-most-once under transient failure)

mod metrics;
mod scheduler;
mod sink;

pub use metrics::{RelayMetrics, RelaySnapshot};
pub use scheduler::{RelayScheduler, SchedulerConfig};
pub use sink::{IngestSink, SinkError};
