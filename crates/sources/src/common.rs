//! Shared listener plumbing
//!
//! The per-listener configuration, the error taxonomy, socket helpers and
//! the metrics counters every listener updates.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};

use relay_protocol::Tag;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpStream, UdpSocket};

/// Default socket buffer size for SO_RCVBUF/SO_SNDBUF (256KB)
const DEFAULT_SOCKET_BUFFER_SIZE: usize = 256 * 1024;

/// Per-listener configuration
///
/// One instance describes one listener; the transport and framing family is
/// chosen by which source type the config is handed to.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Listener identifier, used in logs only
    pub id: String,

    /// Bind address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Numeric tag stamped on every record from this listener
    pub tag: Tag,

    /// Skip timestamp extraction and stamp records with ingestion time
    pub ignore_timestamps: bool,

    /// Interpret zone-less embedded timestamps as local time
    pub assume_local_timezone: bool,

    /// Drop the `<NNN>` prefix from syslog frames (syslog listeners only)
    pub strip_priority: bool,

    /// Record this address instead of the connection/datagram peer address
    pub source_override: Option<IpAddr>,

    /// TCP_NODELAY for stream listeners
    pub nodelay: bool,

    /// Socket buffer size for SO_RCVBUF/SO_SNDBUF
    pub socket_buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            id: "listener".into(),
            address: "0.0.0.0".into(),
            port: 0,
            tag: Tag::default(),
            ignore_timestamps: false,
            assume_local_timezone: false,
            strip_priority: true,
            source_override: None,
            nodelay: true,
            socket_buffer_size: DEFAULT_SOCKET_BUFFER_SIZE,
        }
    }
}

impl ListenerConfig {
    /// Get the socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Resolve the source address recorded for a peer: a configured override
    /// always wins over the peer's own address
    #[inline]
    pub fn resolve_source_ip(&self, peer: IpAddr) -> IpAddr {
        self.source_override.unwrap_or(peer)
    }
}

/// Listener errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The record queue is closed - the relay is no longer accepting records
    #[error("record queue closed")]
    RelayClosed,
}

/// Metrics shared by all listener types
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Currently active connections (or 1/0 for a UDP socket task)
    pub connections_active: AtomicU64,

    /// Total connections accepted
    pub connections_total: AtomicU64,

    /// Records forwarded to the relay queue
    pub records_forwarded: AtomicU64,

    /// Total bytes received
    pub bytes_received: AtomicU64,

    /// Datagrams or lines skipped (oversized, empty after trim)
    pub skipped: AtomicU64,

    /// Errors encountered
    pub errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            records_forwarded: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Increment active connections
    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active connections
    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a forwarded record
    #[inline]
    pub fn record_forwarded(&self, bytes: u64) {
        self.records_forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a skipped candidate
    #[inline]
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            records_forwarded: self.records_forwarded.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of listener metrics
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub records_forwarded: u64,
    pub bytes_received: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Check if an error is a connection reset (expected during shutdown)
pub(crate) fn is_connection_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

/// Apply per-connection socket options to an accepted stream
///
/// Failures are logged and ignored - a connection without tuned buffers
/// still works.
pub(crate) fn configure_stream(stream: &TcpStream, config: &ListenerConfig) {
    if config.nodelay
        && let Err(e) = stream.set_nodelay(true)
    {
        tracing::warn!(error = %e, "failed to set TCP_NODELAY");
    }

    #[cfg(unix)]
    {
        use std::os::fd::{AsRawFd, FromRawFd};

        // SAFETY: the fd is borrowed for the duration of this call; forget()
        // below keeps socket2 from closing it out from under tokio.
        let socket = unsafe { Socket::from_raw_fd(stream.as_raw_fd()) };

        if let Err(e) = socket.set_recv_buffer_size(config.socket_buffer_size) {
            tracing::warn!(error = %e, "failed to set SO_RCVBUF");
        }
        if let Err(e) = socket.set_send_buffer_size(config.socket_buffer_size) {
            tracing::warn!(error = %e, "failed to set SO_SNDBUF");
        }

        std::mem::forget(socket);
    }
}

/// Bind a UDP socket with an enlarged receive buffer
///
/// UDP bursts arrive faster than a single task drains them; the kernel
/// buffer absorbs the difference.
pub(crate) fn bind_udp_socket(
    addr: SocketAddr,
    socket_buffer_size: usize,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;

    if let Err(e) = socket.set_recv_buffer_size(socket_buffer_size) {
        tracing::warn!(
            error = %e,
            requested_size = socket_buffer_size,
            "failed to set UDP SO_RCVBUF"
        );
    }

    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
