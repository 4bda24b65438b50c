//! Raw-line TCP listener
//!
//! Accepts TCP connections and reads newline-delimited text. Each line is
//! trimmed of surrounding whitespace and forwarded as one record; lines that
//! trim to nothing are silently dropped. A partial line at end-of-stream is
//! still forwarded.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_protocol::{trim_frame, LogRecord};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{configure_stream, is_connection_reset, ListenerConfig, SourceError, SourceMetrics};
use crate::dispatch::RecordDispatcher;
use crate::registry::ConnectionRegistry;

/// Raw-line TCP listener
///
/// One handler task per accepted connection; records from one connection
/// reach the queue in the order they were framed.
pub struct LineTcpSource {
    config: ListenerConfig,
    registry: Arc<ConnectionRegistry>,
    tx: mpsc::Sender<LogRecord>,
    metrics: Arc<SourceMetrics>,
}

impl LineTcpSource {
    /// Create a new raw-line TCP listener
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
            "raw-line TCP listener up"
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

        tracing::info!(listener = %self.config.id, "raw-line TCP listener stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        configure_stream(&stream, &self.config);
        self.metrics.connection_opened();

        let token = CancellationToken::new();
        let conn = LineConnection {
            conn_id: self.registry.add(token.clone()),
            token,
            dispatcher: RecordDispatcher::new(&self.config, self.tx.clone()),
            source_ip: self.config.resolve_source_ip(peer.ip()),
            peer,
            registry: Arc::clone(&self.registry),
            metrics: Arc::clone(&self.metrics),
        };

        tokio::spawn(conn.handle(stream));
    }
}

/// Handler for a single raw-line connection
struct LineConnection {
    conn_id: u64,
    token: CancellationToken,
    dispatcher: RecordDispatcher,
    source_ip: std::net::IpAddr,
    peer: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<SourceMetrics>,
}

impl LineConnection {
    async fn handle(self, stream: TcpStream) {
        tracing::debug!(peer = %self.peer, conn_id = self.conn_id, "connection opened");

        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();

        loop {
            line.clear();

            let read = tokio::select! {
                _ = self.token.cancelled() => break,
                read = reader.read_until(b'\n', &mut line) => read,
            };

            match read {
                // End of stream; read_until already returned any final
                // unterminated line on the previous iteration.
                Ok(0) => break,
                Ok(n) => {
                    let trimmed = trim_frame(&line);
                    if trimmed.is_empty() {
                        self.metrics.record_skipped();
                        continue;
                    }
                    if self
                        .dispatcher
                        .dispatch(trimmed.to_vec(), self.source_ip)
                        .await
                        .is_err()
                    {
                        tracing::debug!(peer = %self.peer, "record queue closed, dropping connection");
                        break;
                    }
                    self.metrics.record_forwarded(n as u64);
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
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
