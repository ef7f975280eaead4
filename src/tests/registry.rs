use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::tests::global::{attach_listener, mock_global_state};

#[tokio::test]
async fn test_register_lookup_unregister() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let (meta_id, listener) = attach_listener(&state, room_id, "alice-main").await;

    assert_eq!(state.global.registry.len().await, 1);
    assert!(state.global.registry.keys().await.contains(&meta_id));

    let found = state
        .global
        .registry
        .lookup(meta_id)
        .await
        .expect("listener not registered");
    assert!(Arc::ptr_eq(&found, &listener));

    let removed = state
        .global
        .registry
        .unregister(meta_id)
        .await
        .expect("listener not registered");
    assert!(Arc::ptr_eq(&removed, &listener));

    assert!(state.global.registry.lookup(meta_id).await.is_none());
    assert!(state.global.registry.unregister(meta_id).await.is_none());
    assert_eq!(state.global.registry.len().await, 0);

    listener.close().await.expect("failed to close listener");
}

#[tokio::test]
async fn test_register_overwrites_stale_entry() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let (meta_id, first) = attach_listener(&state, room_id, "alice-main").await;
    let (_, second) = attach_listener(&state, room_id, "alice-retry").await;

    state.global.registry.register(meta_id, second.clone()).await;

    assert_eq!(state.global.registry.len().await, 2);

    let found = state
        .global
        .registry
        .lookup(meta_id)
        .await
        .expect("listener not registered");
    assert!(Arc::ptr_eq(&found, &second));
    assert!(!Arc::ptr_eq(&found, &first));
}

#[tokio::test]
async fn test_concurrent_attach() {
    let state = mock_global_state().await;
    let room_id = Uuid::new_v4();

    let attaches = (0..16)
        .map(|i| {
            let state = &state;
            let name = format!("participant-{}", i);
            async move { attach_listener(state, room_id, &name).await }
        })
        .collect::<Vec<_>>();

    let listeners = join_all(attaches).await;

    assert_eq!(state.global.registry.len().await, 16);

    for (meta_id, _) in &listeners {
        assert!(state.global.registry.lookup(*meta_id).await.is_some());
    }
}
