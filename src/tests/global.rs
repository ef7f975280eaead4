use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::context::{Context, Handler};
use crate::database::{StreamMetadata, StreamStatus};
use crate::global::GlobalState;
use crate::media::{MediaSample, StreamHub};
use crate::recorder::listener::StreamListener;
use crate::registry::ListenerRegistry;
use crate::session::{AvSettings, ParticipantSession, SessionHub};
use crate::tests::memory::{
    MemoryConverter, MemoryMetadataStore, MemoryNotifier, MemoryRecordingStore,
};

pub struct MockState {
    pub global: Arc<GlobalState>,
    pub handler: Handler,
    pub recordings: Arc<MemoryRecordingStore>,
    pub metadata: Arc<MemoryMetadataStore>,
    pub notifier: Arc<MemoryNotifier>,
    pub converter: Arc<MemoryConverter>,
    pub _output_dir: tempfile::TempDir,
}

pub async fn mock_global_state() -> MockState {
    let (ctx, handler) = Context::new();

    crate::logging::init("info", false).expect("failed to initialize logging");

    let output_dir = tempfile::tempdir().expect("failed to create temp dir");

    let mut config = AppConfig::default();
    config.recorder.output_dir = output_dir.path().to_path_buf();
    config.recorder.sample_channel_size = 16;

    let recordings = Arc::new(MemoryRecordingStore::default());
    let metadata = Arc::new(MemoryMetadataStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let converter = Arc::new(MemoryConverter::default());

    let global = Arc::new(GlobalState {
        config,
        ctx,
        media: StreamHub::new(),
        sessions: SessionHub::new(),
        registry: ListenerRegistry::new(),
        recordings: recordings.clone(),
        metadata: metadata.clone(),
        notifier: notifier.clone(),
        converter: converter.clone(),
    });

    MockState {
        global,
        handler,
        recordings,
        metadata,
        notifier,
        converter,
        _output_dir: output_dir,
    }
}

pub fn av_participant(room_id: Uuid, name: &str) -> ParticipantSession {
    let mut session = ParticipantSession::new(room_id, name);
    session.av = AvSettings::AudioVideo;
    session.broadcast_id = Some(format!("{}-main", name));
    session.video_width = 1280;
    session.video_height = 720;
    session
}

pub fn audio_participant(room_id: Uuid, name: &str) -> ParticipantSession {
    let mut session = ParticipantSession::new(room_id, name);
    session.av = AvSettings::AudioOnly;
    session.broadcast_id = Some(format!("{}-main", name));
    session
}

pub fn video_only_participant(room_id: Uuid, name: &str) -> ParticipantSession {
    let mut session = ParticipantSession::new(room_id, name);
    session.av = AvSettings::VideoOnly;
    session.broadcast_id = Some(format!("{}-main", name));
    session
}

pub fn screen_participant(room_id: Uuid, name: &str) -> ParticipantSession {
    let mut session = ParticipantSession::new(room_id, name);
    session.screen_client = true;
    session.screen_publish_started = true;
    session.screen_publish_name = Some(format!("{}-screen", name));
    session
}

/// Inserts the session and publishes the streams it claims to have live.
pub async fn enter(state: &MockState, session: ParticipantSession) -> Uuid {
    let id = session.id;

    if let Some(name) = &session.broadcast_id {
        state.global.media.publish(session.room_id, name).await;
    }

    if session.screen_publish_started {
        if let Some(name) = &session.screen_publish_name {
            state.global.media.publish(session.room_id, name).await;
        }
    }

    state.global.sessions.insert(session).await;

    id
}

/// Publishes a fresh stream, creates a metadata row for it and starts a
/// capture listener.
pub async fn attach_listener(
    state: &MockState,
    room_id: Uuid,
    publish_name: &str,
) -> (Uuid, Arc<StreamListener>) {
    let stream = state.global.media.publish(room_id, publish_name).await;

    let meta = StreamMetadata {
        id: Uuid::new_v4(),
        recording_id: Uuid::new_v4(),
        participant_name: publish_name.to_string(),
        audio_only: false,
        video_only: false,
        screen_share: false,
        file_base_name: format!("test_{}", publish_name),
        interview_pod: None,
        status: StreamStatus::None,
        start_time: chrono::Utc::now(),
        end_time: None,
    };

    state
        .global
        .metadata
        .create(&meta)
        .await
        .expect("failed to create metadata");

    let listener = StreamListener::start(
        meta.id,
        stream,
        state.global.config.recorder.output_dir.join(&meta.file_base_name),
        state.global.config.recorder.sample_channel_size,
        &state.global.registry,
        state.global.metadata.clone(),
    )
    .await;

    (meta.id, listener)
}

pub fn sample(payload: &[u8], timestamp: u32) -> MediaSample {
    MediaSample {
        payload: Bytes::copy_from_slice(payload),
        timestamp,
    }
}
