use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Events fanned out to everyone in a room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    RecordingStarted {
        recording_id: Uuid,
        name: String,
        initiator_id: Uuid,
    },
    RecordingStopped {
        recording_id: Option<Uuid>,
        initiator_id: Uuid,
    },
}

#[async_trait]
pub trait RoomNotifier: Send + Sync + 'static {
    async fn broadcast(&self, room_id: Uuid, event: &RoomEvent) -> Result<()>;
}

/// Publishes room events on NATS, one subject per room.
pub struct NatsNotifier {
    nats: async_nats::Client,
    prefix: String,
}

impl NatsNotifier {
    pub fn new(nats: async_nats::Client, prefix: String) -> Self {
        Self { nats, prefix }
    }
}

#[async_trait]
impl RoomNotifier for NatsNotifier {
    async fn broadcast(&self, room_id: Uuid, event: &RoomEvent) -> Result<()> {
        self.nats
            .publish(
                format!("{}.{}", self.prefix, room_id),
                serde_json::to_vec(event)?.into(),
            )
            .await?;

        Ok(())
    }
}
