//! Server bootstrap and shutdown orchestration
//!
//! Wires the configured listeners, the record queue, the relay scheduler and
//! the downstream sink together, then supervises the ordered shutdown:
//! close listeners, wait (bounded) for them to unwind, close the record
//! queue, let the scheduler flush its final batch, sync and close the sink.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use relay_config::{Config, ConfigError, Framing, ListenerDecl, SinkConfig, Transport};
use relay_pipeline::{IngestSink, RelayScheduler, SchedulerConfig};
use relay_protocol::{LogRecord, Tag};
use relay_sinks::{NullSink, StdoutSink};
use relay_sources::{
    ConnectionRegistry, LineTcpSource, LineUdpSource, ListenerConfig, SyslogTcpSource,
    SyslogUdpSource,
};

/// Extra grace given to the scheduler's own exit after the queue closes
const RELAY_EXIT_GRACE: Duration = Duration::from_secs(5);

/// Load configuration and run the server until a shutdown signal
pub async fn run(config_path: &Path) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "relayd starting"
    );

    let config = Config::from_file(config_path).context("failed to load configuration")?;
    info!(
        listeners = config.listeners.len(),
        tags = ?config.tag_names(),
        "configuration loaded"
    );

    run_server(config).await?;
    info!("relayd shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let sink = build_sink(&config.sink);

    // The relay is useless until the sink can take data; bail out early
    // rather than accepting records we cannot deliver.
    sink.wait_until_ready(config.global.sink_ready_timeout)
        .await
        .context("sink did not become ready")?;

    let (tx, rx) = mpsc::channel::<LogRecord>(config.global.queue_size);
    let registry = Arc::new(ConnectionRegistry::new());
    let cancel = CancellationToken::new();

    // Exactly one scheduler task drains the queue.
    let drain = CancellationToken::new();
    let scheduler = RelayScheduler::new(
        Arc::clone(&sink),
        SchedulerConfig {
            batch_size: config.global.batch_size,
            flush_interval: config.global.flush_interval,
        },
    );
    let relay_task = tokio::spawn(scheduler.run(rx, drain.clone()));

    let listener_tasks = start_listeners(&config, &registry, &tx, &cancel)?;
    // Listener tasks and their connection handlers hold the remaining sender
    // clones; this one is released at shutdown to let the queue close.

    info!(listener_count = listener_tasks.len(), "relayd running");

    wait_for_shutdown().await;
    info!(connections = registry.count(), "shutdown signal received");

    // Stop accepting, then unblock every in-flight read.
    cancel.cancel();
    registry.close_all();

    // Bounded wait: listener tasks joined and every connection deregistered.
    let graceful = tokio::time::timeout(config.global.shutdown_timeout, async {
        for task in listener_tasks {
            let _ = task.await;
        }
        while registry.count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok();

    if !graceful {
        warn!(
            active = registry.count(),
            "timed out waiting for connections to close"
        );
    }

    // Close the queue. On the graceful path every other sender is gone, so
    // the scheduler sees end-of-queue and flushes its final batch; on the
    // timeout path a stuck handler may still hold a sender, so the drain
    // token forces the same final flush.
    drop(tx);
    if !graceful {
        drain.cancel();
    }

    match tokio::time::timeout(RELAY_EXIT_GRACE, relay_task).await {
        Ok(Ok(snapshot)) => {
            info!(
                records = snapshot.records_received,
                batches = snapshot.batches_flushed,
                dropped = snapshot.records_dropped,
                "relay drained"
            );
        }
        Ok(Err(e)) => error!(error = %e, "relay task panicked"),
        Err(_) => {
            drain.cancel();
            error!("relay did not drain in time");
        }
    }

    if let Err(e) = sink.sync(config.global.shutdown_timeout).await {
        error!(error = %e, "failed to sync sink");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "failed to close sink");
    }

    Ok(())
}

/// Build the configured downstream sink
fn build_sink(config: &SinkConfig) -> Arc<dyn IngestSink> {
    match config {
        SinkConfig::Stdout => Arc::new(StdoutSink::new()),
        SinkConfig::Null => Arc::new(NullSink::new()),
    }
}

/// Start every configured listener
fn start_listeners(
    config: &Config,
    registry: &Arc<ConnectionRegistry>,
    tx: &mpsc::Sender<LogRecord>,
    cancel: &CancellationToken,
) -> Result<Vec<JoinHandle<()>>> {
    let mut tasks = Vec::with_capacity(config.listeners.len());

    for decl in &config.listeners {
        let listener_config = listener_config(config, decl)?;
        let id = listener_config.id.clone();

        info!(
            listener = %id,
            transport = decl.transport.as_str(),
            framing = decl.framing.as_str(),
            address = %listener_config.bind_address(),
            tag = %listener_config.tag,
            "starting listener"
        );

        let registry = Arc::clone(registry);
        let tx = tx.clone();
        let cancel = cancel.clone();

        let task = match (decl.transport, decl.framing) {
            (Transport::Tcp, Framing::Line) => {
                let source = LineTcpSource::new(listener_config, registry, tx);
                tokio::spawn(async move {
                    if let Err(e) = source.run(cancel).await {
                        error!(listener = %id, error = %e, "listener failed");
                    }
                })
            }
            (Transport::Udp, Framing::Line) => {
                let source = LineUdpSource::new(listener_config, registry, tx);
                tokio::spawn(async move {
                    if let Err(e) = source.run(cancel).await {
                        error!(listener = %id, error = %e, "listener failed");
                    }
                })
            }
            (Transport::Tcp, Framing::Syslog) => {
                let source = SyslogTcpSource::new(listener_config, registry, tx);
                tokio::spawn(async move {
                    if let Err(e) = source.run(cancel).await {
                        error!(listener = %id, error = %e, "listener failed");
                    }
                })
            }
            (Transport::Udp, Framing::Syslog) => {
                let source = SyslogUdpSource::new(listener_config, registry, tx);
                tokio::spawn(async move {
                    if let Err(e) = source.run(cancel).await {
                        error!(listener = %id, error = %e, "listener failed");
                    }
                })
            }
        };

        tasks.push(task);
    }

    Ok(tasks)
}

/// Map a config declaration onto a runtime listener config
fn listener_config(config: &Config, decl: &ListenerDecl) -> Result<ListenerConfig, ConfigError> {
    Ok(ListenerConfig {
        id: decl.effective_name(),
        address: decl.address.clone(),
        port: decl.port,
        tag: Tag::new(config.tag_index(&decl.tag).unwrap_or(0)),
        ignore_timestamps: decl.ignore_timestamps,
        assume_local_timezone: decl.assume_local_timezone,
        strip_priority: !decl.keep_priority,
        source_override: decl.parsed_source_override()?,
        ..Default::default()
    })
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
