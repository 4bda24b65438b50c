//! Raw-line listeners
//!
//! Newline-delimited text ingestion: one record per non-empty line, over a
//! TCP stream or split out of UDP datagrams.

pub mod tcp;
pub mod udp;

pub use tcp::LineTcpSource;
pub use udp::LineUdpSource;
