//! Relay - Sinks
//!
//! In-process [`IngestSink`](relay_pipeline::IngestSink) implementations for
//! development and testing. The production deployment points the relay at a
//! multiplexed backend transport instead; these sinks exist so the binary
//! runs end-to-end without one.

mod null;
mod stdout;

pub use null::{NullSink, NullSinkSnapshot};
pub use stdout::StdoutSink;
