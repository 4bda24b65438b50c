//! Syslog TCP listener
//!
//! Accepts TCP connections and runs the syslog framing state machine over
//! the byte stream. Frames may span any number of reads; a partial frame at
//! end-of-stream is emitted as a final message.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_protocol::{trim_frame, LogRecord, SyslogFramer};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{configure_stream, is_connection_reset, ListenerConfig, SourceError, SourceMetrics};
use crate::dispatch::RecordDispatcher;
use crate::registry::ConnectionRegistry;

/// Read chunk size for the framing loop (8KB)
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Syslog TCP listener
pub struct SyslogTcpSource {
    config: ListenerConfig,
    registry: Arc<ConnectionRegistry>,
    tx: mpsc::Sender<LogRecord>,
    metrics: Arc<SourceMetrics>,
}

impl SyslogTcpSource {
    /// Create a new syslog TCP listener
    pub fn new(
        config: ListenerConfig,
        registry: Arc<ConnectionRegistry>,
        tx: mpsc::Sender<LogRecord>,
    ) -> Self {
        Self {
            config,
            registry,
            tx,
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<SourceMetrics> {
        &self.metrics
    }

    /// Run the listener until the cancellation token fires
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SourceError> {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| SourceError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        tracing::info!(
            listener = %self.config.id,
            address = %bind_addr,
            tag = %self.config.tag,
            strip_priority = self.config.strip_priority,
            "syslog TCP listener up"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => {
                            self.metrics.error();
                            tracing::warn!(listener = %self.config.id, error = %e, "accept error");
                        }
                    }
                }
            }
        }

        tracing::info!(listener = %self.config.id, "syslog TCP listener stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        configure_stream(&stream, &self.config);
        self.metrics.connection_opened();

        let token = CancellationToken::new();
        let conn = SyslogConnection {
            conn_id: self.registry.add(token.clone()),
            token,
            // The stream path trusts `<...>` frame boundaries; only the UDP
            // decoder validates priority digits.
            framer: SyslogFramer::new(self.config.strip_priority, false),
            dispatcher: RecordDispatcher::new(&self.config, self.tx.clone()),
            source_ip: self.config.resolve_source_ip(peer.ip()),
            peer,
            registry: Arc::clone(&self.registry),
            metrics: Arc::clone(&self.metrics),
        };

        tokio::spawn(conn.handle(stream));
    }
}

/// Handler for a single syslog TCP connection
struct SyslogConnection {
    conn_id: u64,
    token: CancellationToken,
    framer: SyslogFramer,
    dispatcher: RecordDispatcher,
    source_ip: std::net::IpAddr,
    peer: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<SourceMetrics>,
}

impl SyslogConnection {
    async fn handle(mut self, mut stream: TcpStream) {
        tracing::debug!(peer = %self.peer, conn_id = self.conn_id, "connection opened");

        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        'read: loop {
            let read = tokio::select! {
                _ = self.token.cancelled() => break,
                read = stream.read(&mut chunk) => read,
            };

            match read {
                Ok(0) => {
                    // Partial frame at EOF is a valid final message.
                    let last = self.framer.finish();
                    if let Some(last) = last {
                        let _ = self.forward(&last).await;
                    }
                    break;
                }
                Ok(n) => {
                    for frame in self.framer.feed(&chunk[..n]) {
                        if self.forward(&frame).await.is_err() {
                            break 'read;
                        }
                    }
                }
                Err(e) => {
                    if !is_connection_reset(&e) {
                        self.metrics.error();
                        tracing::warn!(peer = %self.peer, error = %e, "read error");
                    }
                    break;
                }
            }
        }

        self.registry.remove(self.conn_id);
        self.metrics.connection_closed();
        tracing::debug!(peer = %self.peer, conn_id = self.conn_id, "connection closed");
    }

    /// Trim a completed frame and dispatch it; empty frames are dropped
    async fn forward(&self, frame: &[u8]) -> Result<(), SourceError> {
        let trimmed = trim_frame(frame);
        if trimmed.is_empty() {
            self.metrics.record_skipped();
            return Ok(());
        }

        match self
            .dispatcher
            .dispatch(trimmed.to_vec(), self.source_ip)
            .await
        {
            Ok(()) => {
                self.metrics.record_forwarded(trimmed.len() as u64);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(peer = %self.peer, "record queue closed, dropping connection");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
