//! Raw-line UDP listener
//!
//! One task owns the socket and one reused receive buffer. Each datagram is
//! split on `\n`; every line is trimmed, copied out of the shared buffer,
//! and forwarded. Empty and buffer-filling (possibly truncated) datagrams
//! are skipped silently - one lost datagram, never a dead listener.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_protocol::{split_lines, LogRecord, UDP_RECV_BUFFER_SIZE};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{bind_udp_socket, ListenerConfig, SourceError, SourceMetrics};
use crate::dispatch::RecordDispatcher;
use crate::registry::ConnectionRegistry;

/// Raw-line UDP listener
pub struct LineUdpSource {
    config: ListenerConfig,
    registry: Arc<ConnectionRegistry>,
    tx: mpsc::Sender<LogRecord>,
    metrics: Arc<SourceMetrics>,
}

impl LineUdpSource {
    /// Create a new raw-line UDP listener
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

    /// Run the listener until cancelled
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SourceError> {
        let bind_addr = self.config.bind_address();
        let addr: SocketAddr = bind_addr.parse().map_err(|_| SourceError::Bind {
            address: bind_addr.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid socket address"),
        })?;
        let socket =
            bind_udp_socket(addr, self.config.socket_buffer_size).map_err(|e| SourceError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        let token = CancellationToken::new();
        let sock_id = self.registry.add(token.clone());
        self.metrics.connection_opened();

        let dispatcher = RecordDispatcher::new(&self.config, self.tx.clone());
        let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];

        tracing::info!(
            listener = %self.config.id,
            address = %bind_addr,
            tag = %self.config.tag,
            "raw-line UDP listener up"
        );

        'recv: loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = token.cancelled() => break,
                received = socket.recv_from(&mut buf) => received,
            };

            match received {
                Ok((0, _)) => continue,
                Ok((len, peer)) if len >= buf.len() => {
                    // A datagram filling the whole buffer may have been
                    // truncated by the transport; skip it and move on.
                    self.metrics.record_skipped();
                    tracing::debug!(
                        listener = %self.config.id,
                        peer = %peer,
                        len,
                        "oversized datagram skipped"
                    );
                }
                Ok((len, peer)) => {
                    let source_ip = self.config.resolve_source_ip(peer.ip());
                    for line in split_lines(&buf[..len]) {
                        // The receive buffer is reused for the next datagram,
                        // so every line is copied before it leaves this loop.
                        if self
                            .forward(&dispatcher, line.to_vec(), source_ip)
                            .await
                            .is_err()
                        {
                            break 'recv;
                        }
                    }
                }
                Err(e) => {
                    self.metrics.error();
                    tracing::warn!(listener = %self.config.id, error = %e, "receive error");
                    break;
                }
            }
        }

        self.registry.remove(sock_id);
        self.metrics.connection_closed();
        tracing::info!(listener = %self.config.id, "raw-line UDP listener stopped");
        Ok(())
    }

    async fn forward(
        &self,
        dispatcher: &RecordDispatcher,
        payload: Vec<u8>,
        source_ip: std::net::IpAddr,
    ) -> Result<(), SourceError> {
        let len = payload.len() as u64;
        match dispatcher.dispatch(payload, source_ip).await {
            Ok(()) => {
                self.metrics.record_forwarded(len);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(listener = %self.config.id, "record queue closed, stopping");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod udp_test;
