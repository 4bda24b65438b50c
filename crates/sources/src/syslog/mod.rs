//! Syslog-framed listeners
//!
//! `<PRI>`-delimited syslog ingestion over TCP streams and UDP datagrams,
//! built on [`SyslogFramer`](relay_protocol::SyslogFramer). The UDP variant
//! validates priority fields so stray `<...>` sequences in free-form payload
//! cannot corrupt framing; the TCP variant trusts the stream.

pub mod tcp;
pub mod udp;

pub use tcp::SyslogTcpSource;
pub use udp::SyslogUdpSource;
