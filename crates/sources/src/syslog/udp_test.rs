//! Tests for the syslog UDP listener

use std::sync::Arc;
use std::time::Duration;

use relay_protocol::{LogRecord, Tag};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::ListenerConfig;
use crate::registry::ConnectionRegistry;
use crate::syslog::udp::SyslogUdpSource;

async fn free_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    drop(socket);
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
        id: "syslog_udp_test".into(),
        address: "127.0.0.1".into(),
        port,
        tag: Tag::new(4),
        ignore_timestamps: true,
        strip_priority,
        ..Default::default()
    }
}

async fn start_source(
    config: ListenerConfig,
) -> (
    UdpSocket,
    mpsc::Receiver<LogRecord>,
    CancellationToken,
    tokio::task::JoinHandle<()>,
) {
    let port = config.port;
    let registry = Arc::new(ConnectionRegistry::new());
    let (tx, rx) = mpsc::channel(64);
    let source = SyslogUdpSource::new(config, registry, tx);

    let cancel = CancellationToken::new();
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = source.run(cancel).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.connect(("127.0.0.1", port)).await.unwrap();

    (client, rx, cancel, task)
}

#[tokio::test]
async fn test_two_frames_in_one_datagram() {
    let port = free_port().await;
    let (client, mut rx, cancel, task) = start_source(test_config(port, true)).await;

    client
        .send(b"<34>host app: hello<35>host app: world")
        .await
        .unwrap();

    let records = recv_n(&mut rx, 2).await;
    assert_eq!(records[0].payload(), b"host app: hello");
    assert_eq!(records[1].payload(), b"host app: world");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}

#[tokio::test]
async fn test_malformed_priority_recovers() {
    let port = free_port().await;
    let (client, mut rx, cancel, task) = start_source(test_config(port, true)).await;

    // `<bogus>` is not a frame boundary; the well-formed frame later in the
    // same datagram must still be recovered, with no garbage records.
    client.send(b"<bogus>junk bytes<34>real thing").await.unwrap();

    let records = recv_n(&mut rx, 1).await;
    assert_eq!(records[0].payload(), b"real thing");

    // No further records from that datagram.
    client.send(b"<35>sentinel").await.unwrap();
    let records = recv_n(&mut rx, 1).await;
    assert_eq!(records[0].payload(), b"sentinel");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}

#[tokio::test]
async fn test_priority_kept() {
    let port = free_port().await;
    let (client, mut rx, cancel, task) = start_source(test_config(port, false)).await;

    client.send(b"<34>with prefix").await.unwrap();

    let records = recv_n(&mut rx, 1).await;
    assert_eq!(records[0].payload(), b"<34>with prefix");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}

#[tokio::test]
async fn test_framer_state_resets_between_datagrams() {
    let port = free_port().await;
    let (client, mut rx, cancel, task) = start_source(test_config(port, true)).await;

    // First datagram ends mid-message; its remainder is emitted as a final
    // message and must not prefix the next datagram's first frame.
    client.send(b"<34>trailing body").await.unwrap();
    client.send(b"<35>fresh frame").await.unwrap();

    let records = recv_n(&mut rx, 2).await;
    assert_eq!(records[0].payload(), b"trailing body");
    assert_eq!(records[1].payload(), b"fresh frame");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
}
