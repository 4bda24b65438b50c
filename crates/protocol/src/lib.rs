//! Relay - Protocol
//!
//! Core data types and framing logic shared by the listeners and the relay
//! scheduler:
//!
//! - [`LogRecord`] / [`Tag`] - the immutable unit of data that flows from a
//!   listener through the record queue into a batch
//! - [`SyslogFramer`] - incremental state machine that carves `<PRI>`-framed
//!   syslog messages out of a byte stream or datagram
//! - [`trim_frame`] / [`split_lines`] - the byte-level helpers every decoder
//!   shares
//!
//! Everything in this crate is socket-free and synchronous so the framing
//! logic can be tested without a live connection.

mod framing;
mod record;

pub use framing::{split_lines, FramerState, SyslogFramer};
pub use record::{trim_frame, LogRecord, Tag};

/// Maximum records accumulated before the relay flushes a batch
pub const BATCH_SIZE: usize = 512;

/// Capacity of the record queue between listeners and the relay
pub const RECORD_QUEUE_SIZE: usize = 2048;

/// Receive buffer size for UDP listeners (16 KiB)
pub const UDP_RECV_BUFFER_SIZE: usize = 16 * 1024;
