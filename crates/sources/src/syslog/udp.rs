//! Syslog UDP listener
//!
//! Runs the syslog framing state machine over each datagram independently,
//! with priority validation enabled: a `<...>` whose interior is not numeric
//! is not a frame boundary, so free-form payload containing stray angle
//! brackets cannot corrupt framing. The remainder of a datagram while still
//! in-message is emitted as a final message.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_protocol::{trim_frame, LogRecord, SyslogFramer, UDP_RECV_BUFFER_SIZE};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{bind_udp_socket, ListenerConfig, SourceError, SourceMetrics};
use crate::dispatch::RecordDispatcher;
use crate::registry::ConnectionRegistry;

/// Syslog UDP listener
pub struct SyslogUdpSource {
    config: ListenerConfig,
    registry: Arc<ConnectionRegistry>,
    tx: mpsc::Sender<LogRecord>,
    metrics: Arc<SourceMetrics>,
}

impl SyslogUdpSource {
    /// Create a new syslog UDP listener
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
        let mut framer = SyslogFramer::new(self.config.strip_priority, true);
        let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];

        tracing::info!(
            listener = %self.config.id,
            address = %bind_addr,
            tag = %self.config.tag,
            strip_priority = self.config.strip_priority,
            "syslog UDP listener up"
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

                    // One datagram is one framing unit: feed then finish, so
                    // no state leaks into the next datagram.
                    let mut frames = framer.feed(&buf[..len]);
                    frames.extend(framer.finish());

                    for frame in frames {
                        if self
                            .forward(&dispatcher, &frame, source_ip)
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
        tracing::info!(listener = %self.config.id, "syslog UDP listener stopped");
        Ok(())
    }

    /// Trim a completed frame and dispatch it; empty frames are dropped
    async fn forward(
        &self,
        dispatcher: &RecordDispatcher,
        frame: &[u8],
        source_ip: std::net::IpAddr,
    ) -> Result<(), SourceError> {
        let trimmed = trim_frame(frame);
        if trimmed.is_empty() {
            self.metrics.record_skipped();
            return Ok(());
        }

        match dispatcher.dispatch(trimmed.to_vec(), source_ip).await {
            Ok(()) => {
                self.metrics.record_forwarded(trimmed.len() as u64);
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
