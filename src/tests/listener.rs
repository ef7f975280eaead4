use std::time::Duration;

use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::database::StreamStatus;
use crate::tests::global::{attach_listener, mock_global_state, sample};

#[tokio::test]
async fn test_first_sample_advances_status() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let (meta_id, listener) = attach_listener(&state, room_id, "alice-main").await;
    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::None));

    let stream = state
        .global
        .media
        .find(room_id, "alice-main")
        .await
        .expect("stream not found");

    stream.broadcast(sample(b"first", 1)).await;
    stream.broadcast(sample(b"second", 2)).await;

    timeout(Duration::from_secs(1), async {
        loop {
            if listener.bytes_captured() == 11 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("samples never landed");

    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::Started));
    assert_eq!(listener.last_timestamp(), 2);
    assert!(!listener.end_of_stream());

    listener.close().await.expect("failed to close listener");

    // cut off without end-of-stream, the status is left for the caller
    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::Started));

    let contents = std::fs::read(
        state.global.config.recorder.output_dir.join("test_alice-main"),
    )
    .expect("capture file missing");
    assert_eq!(contents, b"firstsecond");
}

#[tokio::test]
async fn test_natural_end_releases_listener() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let (meta_id, listener) = attach_listener(&state, room_id, "alice-main").await;

    let stream = state
        .global
        .media
        .find(room_id, "alice-main")
        .await
        .expect("stream not found");
    stream.broadcast(sample(b"data", 7)).await;

    state.global.media.unpublish(room_id, "alice-main").await;

    timeout(Duration::from_secs(1), async {
        loop {
            if state.global.registry.lookup(meta_id).await.is_none() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener never released itself");

    assert!(listener.end_of_stream());
    assert_eq!(listener.bytes_captured(), 4);

    // the natural end alone does not settle the status
    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::Started));

    // an explicit close after the end does
    listener.close().await.expect("failed to close listener");
    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::Stopped));
}

#[tokio::test]
async fn test_close_idempotent() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let (meta_id, listener) = attach_listener(&state, room_id, "alice-main").await;

    let stream = state
        .global
        .media
        .find(room_id, "alice-main")
        .await
        .expect("stream not found");
    stream.close().await;

    timeout(Duration::from_secs(1), async {
        loop {
            if listener.end_of_stream() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener never saw end of stream");

    listener.close().await.expect("first close failed");
    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::Stopped));

    listener.close().await.expect("second close failed");
    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::Stopped));
}

#[tokio::test]
async fn test_close_before_any_sample() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let (meta_id, listener) = attach_listener(&state, room_id, "alice-main").await;

    listener.close().await.expect("failed to close listener");

    assert_eq!(state.metadata.status_of(meta_id), Some(StreamStatus::None));
    assert_eq!(listener.bytes_captured(), 0);

    // the capture file was still created, just empty
    let contents = std::fs::read(
        state.global.config.recorder.output_dir.join("test_alice-main"),
    )
    .expect("capture file missing");
    assert!(contents.is_empty());
}
