use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::media::{StreamEvent, StreamHub};
use crate::tests::global::sample;

#[tokio::test]
async fn test_publish_find_unpublish() {
    let hub = StreamHub::new();
    let room_id = Uuid::new_v4();

    assert!(hub.find(room_id, "alice-main").await.is_none());

    let stream = hub.publish(room_id, "alice-main").await;

    let found = hub.find(room_id, "alice-main").await.expect("stream not found");
    assert!(Arc::ptr_eq(&stream, &found));
    assert_eq!(found.room_id(), room_id);
    assert_eq!(found.publish_name(), "alice-main");

    // same publish name in a different room is a different stream
    assert!(hub.find(Uuid::new_v4(), "alice-main").await.is_none());

    hub.unpublish(room_id, "alice-main").await;
    assert!(hub.find(room_id, "alice-main").await.is_none());
    assert!(stream.is_ended());
}

#[tokio::test]
async fn test_broadcast_reaches_attached_sinks() {
    let hub = StreamHub::new();
    let room_id = Uuid::new_v4();
    let stream = hub.publish(room_id, "alice-main").await;

    let (tx_a, mut rx_a) = mpsc::channel(4);
    let (tx_b, mut rx_b) = mpsc::channel(4);
    stream.attach(tx_a).await;
    stream.attach(tx_b).await;

    stream.broadcast(sample(b"hello", 42)).await;

    for rx in [&mut rx_a, &mut rx_b] {
        match rx.recv().await {
            Some(StreamEvent::Sample(s)) => {
                assert_eq!(s.payload, Bytes::from_static(b"hello"));
                assert_eq!(s.timestamp, 42);
            }
            other => panic!("expected a sample, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_close_notifies_sinks() {
    let hub = StreamHub::new();
    let room_id = Uuid::new_v4();
    let stream = hub.publish(room_id, "alice-main").await;

    let (tx, mut rx) = mpsc::channel(4);
    stream.attach(tx).await;

    stream.close().await;
    assert!(stream.is_ended());

    match rx.recv().await {
        Some(StreamEvent::Closed) => {}
        other => panic!("expected closed, got {:?}", other),
    }

    // attaching to an ended stream reports the closure immediately
    let (tx, mut rx) = mpsc::channel(4);
    stream.attach(tx).await;

    match rx.recv().await {
        Some(StreamEvent::Closed) => {}
        other => panic!("expected closed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_detach_drops_the_sender() {
    let hub = StreamHub::new();
    let room_id = Uuid::new_v4();
    let stream = hub.publish(room_id, "alice-main").await;

    let (tx, mut rx) = mpsc::channel(4);
    let slot = stream.attach(tx).await;

    assert!(stream.detach(slot).await);
    assert!(!stream.detach(slot).await);

    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_detach_all() {
    let hub = StreamHub::new();
    let room_id = Uuid::new_v4();
    let stream = hub.publish(room_id, "alice-main").await;

    let (tx_a, mut rx_a) = mpsc::channel(4);
    let (tx_b, mut rx_b) = mpsc::channel(4);
    stream.attach(tx_a).await;
    stream.attach(tx_b).await;

    assert_eq!(stream.detach_all().await, 2);
    assert_eq!(stream.detach_all().await, 0);

    assert!(rx_a.recv().await.is_none());
    assert!(rx_b.recv().await.is_none());

    // the stream itself is still live
    assert!(!stream.is_ended());
}
