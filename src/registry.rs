use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::recorder::listener::StreamListener;

/// All capture listeners that are currently live, keyed by the metadata id
/// of the stream they record.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<HashMap<Uuid, Arc<StreamListener>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, meta_id: Uuid, listener: Arc<StreamListener>) {
        let mut listeners = self.listeners.write().await;

        if listeners.insert(meta_id, listener).is_some() {
            tracing::warn!(meta_id = %meta_id, "replaced a stale capture listener");
        }
    }

    pub async fn lookup(&self, meta_id: Uuid) -> Option<Arc<StreamListener>> {
        let listeners = self.listeners.read().await;

        listeners.get(&meta_id).cloned()
    }

    /// Removes and returns the listener. The caller owns shutting it down.
    pub async fn unregister(&self, meta_id: Uuid) -> Option<Arc<StreamListener>> {
        let mut listeners = self.listeners.write().await;

        listeners.remove(&meta_id)
    }

    pub async fn len(&self) -> usize {
        let listeners = self.listeners.read().await;

        listeners.len()
    }

    pub async fn keys(&self) -> Vec<Uuid> {
        let listeners = self.listeners.read().await;

        listeners.keys().copied().collect()
    }
}
