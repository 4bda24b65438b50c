//! Tests for record construction and dispatch

use std::net::{IpAddr, Ipv4Addr};

use chrono::{Datelike, Timelike, Utc};
use relay_protocol::Tag;
use tokio::sync::mpsc;

use crate::common::{ListenerConfig, SourceError};
use crate::dispatch::RecordDispatcher;

fn peer() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7))
}

#[tokio::test]
async fn test_dispatch_builds_record_with_listener_tag() {
    let config = ListenerConfig {
        tag: Tag::new(5),
        ignore_timestamps: true,
        ..Default::default()
    };
    let (tx, mut rx) = mpsc::channel(8);
    let dispatcher = RecordDispatcher::new(&config, tx);

    dispatcher.dispatch(b"hello".to_vec(), peer()).await.unwrap();

    let record = rx.recv().await.unwrap();
    assert_eq!(record.tag(), Tag::new(5));
    assert_eq!(record.source_ip(), peer());
    assert_eq!(record.payload(), b"hello");
}

#[tokio::test]
async fn test_ignore_timestamps_uses_ingestion_time() {
    let config = ListenerConfig {
        ignore_timestamps: true,
        ..Default::default()
    };
    let (tx, mut rx) = mpsc::channel(8);
    let dispatcher = RecordDispatcher::new(&config, tx);

    let before = Utc::now();
    dispatcher
        .dispatch(b"2001-01-01T00:00:00Z old event".to_vec(), peer())
        .await
        .unwrap();
    let after = Utc::now();

    let record = rx.recv().await.unwrap();
    // The embedded 2001 timestamp must be ignored.
    assert!(record.timestamp() >= before && record.timestamp() <= after);
}

#[tokio::test]
async fn test_embedded_timestamp_is_extracted() {
    let config = ListenerConfig::default();
    let (tx, mut rx) = mpsc::channel(8);
    let dispatcher = RecordDispatcher::new(&config, tx);

    dispatcher
        .dispatch(b"2024-03-01T12:34:56Z app started".to_vec(), peer())
        .await
        .unwrap();

    let record = rx.recv().await.unwrap();
    assert_eq!(record.timestamp().year(), 2024);
    assert_eq!(record.timestamp().hour(), 12);
}

#[tokio::test]
async fn test_missing_timestamp_falls_back_to_ingestion_time() {
    let config = ListenerConfig::default();
    let (tx, mut rx) = mpsc::channel(8);
    let dispatcher = RecordDispatcher::new(&config, tx);

    let before = Utc::now();
    dispatcher
        .dispatch(b"no timestamp in here".to_vec(), peer())
        .await
        .unwrap();

    let record = rx.recv().await.unwrap();
    assert!(record.timestamp() >= before);
}

#[tokio::test]
async fn test_closed_queue_is_terminal() {
    let config = ListenerConfig::default();
    let (tx, rx) = mpsc::channel(8);
    drop(rx);
    let dispatcher = RecordDispatcher::new(&config, tx);

    let err = dispatcher
        .dispatch(b"too late".to_vec(), peer())
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::RelayClosed));
}
