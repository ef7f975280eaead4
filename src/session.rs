use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

/// Which media a participant negotiated for their main publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvSettings {
    /// Nothing negotiated yet
    #[default]
    None,
    AudioVideo,
    AudioOnly,
    VideoOnly,
}

/// Live signaling state for one connected client.
///
/// A participant joining with a screen share uses a second session with
/// `screen_client` set, tied to the same user.
#[derive(Debug, Clone)]
pub struct ParticipantSession {
    pub id: Uuid,
    pub room_id: Uuid,
    pub display_name: String,
    /// Authenticated user behind the session, if any
    pub user_id: Option<Uuid>,
    /// Room owner the session acts for, when it differs from the user
    pub owner_id: Option<Uuid>,
    pub connected: bool,
    /// The session is a dedicated screen share client
    pub screen_client: bool,
    /// The screen share actually started publishing
    pub screen_publish_started: bool,
    pub screen_publish_name: Option<String>,
    /// Publish name of the main audio/video broadcast
    pub broadcast_id: Option<String>,
    pub av: AvSettings,
    /// Interview pod the session occupies, if the room runs interviews
    pub interview_pod: Option<i32>,
    pub video_width: i32,
    pub video_height: i32,
    /// The session started the recording running in its room
    pub recording: bool,
    pub recording_id: Option<Uuid>,
    /// Metadata row of the session's active capture
    pub meta_id: Option<Uuid>,
}

impl ParticipantSession {
    pub fn new(room_id: Uuid, display_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            display_name: display_name.to_string(),
            user_id: None,
            owner_id: None,
            connected: true,
            screen_client: false,
            screen_publish_started: false,
            screen_publish_name: None,
            broadcast_id: None,
            av: AvSettings::None,
            interview_pod: None,
            video_width: 0,
            video_height: 0,
            recording: false,
            recording_id: None,
            meta_id: None,
        }
    }

    /// Recordings belong to the room owner when one is set, otherwise to the
    /// authenticated user.
    pub fn effective_owner(&self) -> Option<Uuid> {
        self.owner_id.or(self.user_id)
    }
}

/// All live sessions, keyed by session id.
#[derive(Default)]
pub struct SessionHub {
    sessions: RwLock<HashMap<Uuid, ParticipantSession>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ParticipantSession) {
        let mut sessions = self.sessions.write().await;

        sessions.insert(session.id, session);
    }

    pub async fn get(&self, id: Uuid) -> Option<ParticipantSession> {
        let sessions = self.sessions.read().await;

        sessions.get(&id).cloned()
    }

    pub async fn list_by_room(&self, room_id: Uuid) -> Vec<ParticipantSession> {
        let sessions = self.sessions.read().await;

        sessions
            .values()
            .filter(|session| session.room_id == room_id)
            .cloned()
            .collect()
    }

    /// Applies `update` to the session in place. Returns false when the
    /// session is already gone.
    pub async fn update(&self, id: Uuid, update: impl FnOnce(&mut ParticipantSession)) -> bool {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(&id) {
            Some(session) => {
                update(session);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<ParticipantSession> {
        let mut sessions = self.sessions.write().await;

        sessions.remove(&id)
    }
}
