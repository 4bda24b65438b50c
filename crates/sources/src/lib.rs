//! Relay - Sources
//!
//! Network listeners that turn byte streams and datagrams into
//! [`LogRecord`](relay_protocol::LogRecord)s on the relay queue.
//!
//! # Available listeners
//!
//! - **Raw-line TCP** - newline-delimited text over a stream
//! - **Raw-line UDP** - newline-delimited text, one or more lines per datagram
//! - **Syslog TCP** - `<PRI>`-framed syslog over a stream
//! - **Syslog UDP** - `<PRI>`-framed syslog per datagram, with priority
//!   validation so free-form payload cannot corrupt framing
//!
//! # Design
//!
//! - One tokio task per accepted TCP connection, one per UDP socket
//! - Every blocking read lives in a `select!` with a cancellation token, so
//!   shutdown can interrupt it; accepted connections and UDP sockets are
//!   registered in a [`ConnectionRegistry`] whose `close_all` drives
//!   coordinated shutdown
//! - Records go to the relay through a bounded `mpsc` queue; a full queue
//!   blocks the listener (backpressure), a closed queue terminates it

pub mod line;
pub mod syslog;

mod common;
mod dispatch;
mod registry;

pub use common::{ListenerConfig, MetricsSnapshot, SourceError, SourceMetrics};
pub use dispatch::RecordDispatcher;
pub use line::{LineTcpSource, LineUdpSource};
pub use registry::ConnectionRegistry;
pub use syslog::{SyslogTcpSource, SyslogUdpSource};
