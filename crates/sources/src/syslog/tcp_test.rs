//! Tests for the syslog TCP listener

use std::sync::Arc;
use std::time::Duration;

use relay_protocol::{LogRecord, Tag};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::ListenerConfig;
use crate::registry::ConnectionRegistry;
use crate::syslog::tcp::SyslogTcpSource;

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn recv_n(rx: &mut mpsc::Receiver<LogRecord>, n: usize) -> Vec<LogRecord> {
    let mut records = Vec::with_capacity(n);
    for _ in 0..n {
        let record = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for record")
            .expect("queue closed early");
        records.push(record);
    }
    records
}

fn test_config(port: u16, strip_priority: bool) -> ListenerConfig {
    ListenerConfig {
        id: "syslog_tcp_test".into(),
        address: "127.0.0.1".into(),
        port,
        tag: Tag::new(2),
        ignore_timestamps: true,
        strip_priority,
        ..Default::default()
    }
}

async fn start_source(
    config: ListenerConfig,
) -> (
    mpsc::Receiver<LogRecord>,
    CancellationToken,
    tokio::task::JoinHandle<()>,
) {
    let registry = Arc::new(ConnectionRegistry::new());
    let (tx, rx) = mpsc::channel(64);
    let source = SyslogTcpSource::new(config, registry, tx);

    let cancel = CancellationToken::new();
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = source.run(cancel).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    (rx, cancel, task)
}

#[tokio::test]
async fn test_priority_stripped() {
    let port = free_port().await;
    let (mut rx, cancel, task) = start_source(test_config(port, true)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"<34>host app: hello\n<35>host app: world\n")
        .await
        .unwrap();
    stream.flush().await.unwrap();
    // Closing the stream ends the final frame.
    drop(stream);

    let records = recv_n(&mut rx, 2).await;
    assert_eq!(records[0].payload(), b"host app: hello");
    assert_eq!(records[1].payload(), b"host app: world");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}

#[tokio::test]
async fn test_priority_kept() {
    let port = free_port().await;
    let (mut rx, cancel, task) = start_source(test_config(port, false)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"<34>host app: hello\n<35>host app: world\n")
        .await
        .unwrap();
    stream.flush().await.unwrap();
    drop(stream);

    let records = recv_n(&mut rx, 2).await;
    assert_eq!(records[0].payload(), b"<34>host app: hello");
    assert_eq!(records[1].payload(), b"<35>host app: world");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}

#[tokio::test]
async fn test_frames_across_slow_writes() {
    // Frames split at arbitrary write boundaries must decode identically to
    // a single write.
    let port = free_port().await;
    let (mut rx, cancel, task) = start_source(test_config(port, true)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    for piece in [
        &b"<3"[..],
        &b"4>slow "[..],
        &b"message one"[..],
        &b"<35>and "[..],
        &b"two"[..],
    ] {
        stream.write_all(piece).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    drop(stream);

    let records = recv_n(&mut rx, 2).await;
    assert_eq!(records[0].payload(), b"slow message one");
    assert_eq!(records[1].payload(), b"and two");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}

#[tokio::test]
async fn test_rfc5424_style_message() {
    let port = free_port().await;
    let (mut rx, cancel, task) = start_source(test_config(port, false)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"<165>1 2023-12-20T12:36:15.003Z server1.example.com myapp 1234 ID47 - started\n")
        .await
        .unwrap();
    stream.flush().await.unwrap();
    drop(stream);

    let records = recv_n(&mut rx, 1).await;
    let payload = std::str::from_utf8(records[0].payload()).unwrap();
    assert!(payload.starts_with("<165>1"));
    assert!(payload.contains("server1.example.com"));
    assert!(!payload.ends_with('\n'));

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}
