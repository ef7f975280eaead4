use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::database::{Recording, StreamMetadata, StreamStatus};
use crate::global::GlobalState;
use crate::notify::RoomEvent;
use crate::recorder::capture::{self, CaptureKind};
use crate::recorder::errors::CaptureError;
use crate::recorder::lifecycle;
use crate::recorder::listener::StreamListener;
use crate::session::ParticipantSession;

/// Starts capturing every qualifying participant in the initiator's room.
///
/// Returns the recording name, or None when the start failed as a whole.
/// A single participant failing to attach does not fail the start.
pub async fn start_room_recording(
    global: &Arc<GlobalState>,
    initiator_id: Uuid,
    name: &str,
    comment: Option<String>,
    interview: bool,
) -> Option<String> {
    match try_start_room_recording(global, initiator_id, name, comment, interview).await {
        Ok(name) => Some(name),
        Err(err) => {
            tracing::error!(
                initiator_id = %initiator_id,
                error = %err,
                "failed to start room recording",
            );
            None
        }
    }
}

async fn try_start_room_recording(
    global: &Arc<GlobalState>,
    initiator_id: Uuid,
    name: &str,
    comment: Option<String>,
    interview: bool,
) -> Result<String> {
    let initiator = global
        .sessions
        .get(initiator_id)
        .await
        .ok_or_else(|| anyhow::anyhow!("initiating session {} not found", initiator_id))?;

    let recording =
        lifecycle::create_recording(global, &initiator, name, comment, interview).await?;

    global
        .sessions
        .update(initiator_id, |session| {
            session.recording = true;
            session.recording_id = Some(recording.id);
        })
        .await;

    if let Err(err) = global
        .notifier
        .broadcast(
            initiator.room_id,
            &RoomEvent::RecordingStarted {
                recording_id: recording.id,
                name: recording.name.clone(),
                initiator_id,
            },
        )
        .await
    {
        tracing::warn!(
            room_id = %initiator.room_id,
            error = %err,
            "failed to announce recording start",
        );
    }

    for participant in global.sessions.list_by_room(initiator.room_id).await {
        if !participant.connected {
            continue;
        }

        let Some(kind) = capture::classify(&participant) else {
            continue;
        };

        if let Err(err) = capture_participant(global, &participant, &recording, kind).await {
            tracing::warn!(
                session_id = %participant.id,
                display_name = %participant.display_name,
                error = %err,
                "failed to capture participant, continuing with the rest",
            );
        }
    }

    let active_listeners = global.registry.len().await;
    tracing::info!(
        recording_id = %recording.id,
        room_id = %initiator.room_id,
        active_listeners,
        "room recording started",
    );

    Ok(recording.name)
}

/// Creates the metadata row for one participant and attaches a capture
/// listener to their live stream.
///
/// The metadata row exists before the listener is registered, and the
/// listener is registered before the id lands on the session, so any stop
/// that can see the id can also see the listener.
pub(crate) async fn capture_participant(
    global: &Arc<GlobalState>,
    participant: &ParticipantSession,
    recording: &Recording,
    kind: CaptureKind,
) -> Result<Uuid, CaptureError> {
    let publish_name =
        capture::publish_name(participant, kind).ok_or(CaptureError::MissingPublishName)?;

    let stream = global
        .media
        .find(participant.room_id, &publish_name)
        .await
        .ok_or_else(|| CaptureError::StreamGone(publish_name.clone()))?;

    let now = Utc::now();
    let meta = StreamMetadata {
        id: Uuid::new_v4(),
        recording_id: recording.id,
        participant_name: participant.display_name.clone(),
        audio_only: kind.is_audio_only(),
        video_only: false,
        screen_share: kind.is_screen_share(),
        file_base_name: capture::file_base_name(recording.id, participant.id, now),
        interview_pod: participant.interview_pod,
        status: StreamStatus::None,
        start_time: now,
        end_time: None,
    };

    global.metadata.create(&meta).await?;

    let path = global.config.recorder.output_dir.join(&meta.file_base_name);

    StreamListener::start(
        meta.id,
        stream,
        path,
        global.config.recorder.sample_channel_size,
        &global.registry,
        global.metadata.clone(),
    )
    .await;

    global
        .sessions
        .update(participant.id, |session| {
            session.meta_id = Some(meta.id);
        })
        .await;

    tracing::debug!(
        meta_id = %meta.id,
        session_id = %participant.id,
        publish_name = %publish_name,
        kind = ?kind,
        "capture attached",
    );

    Ok(meta.id)
}

/// Stops the capture of one published stream and settles its metadata.
///
/// Tolerates streams that already vanished and metadata that was never
/// bound. Never unwinds into the caller for state that is merely absent.
pub async fn stop_single_stream(
    global: &Arc<GlobalState>,
    room_id: Uuid,
    publish_name: &str,
    meta_id: Option<Uuid>,
) -> Result<()> {
    match global.media.find(room_id, publish_name).await {
        Some(stream) => {
            let detached = stream.detach_all().await;
            tracing::debug!(
                room_id = %room_id,
                publish_name = %publish_name,
                detached = detached,
                "detached stream sinks",
            );
        }
        None => {
            // The publisher likely disconnected ungracefully. Metadata
            // cleanup below still applies.
            tracing::debug!(
                room_id = %room_id,
                publish_name = %publish_name,
                "media stream already gone",
            );
        }
    }

    let Some(meta_id) = meta_id else {
        tracing::debug!(
            room_id = %room_id,
            publish_name = %publish_name,
            "no metadata bound to the stream, nothing to update",
        );
        return Ok(());
    };

    let Some(meta) = global.metadata.get(meta_id).await? else {
        tracing::warn!(meta_id = %meta_id, "stream metadata not found");
        return Ok(());
    };

    if meta.status == StreamStatus::None {
        tracing::debug!(meta_id = %meta_id, "stream never produced samples, leaving status untouched");
        return Ok(());
    }

    // A started stream with no registered listener already ended naturally,
    // so it can settle at stopped right away. Anything else still has a
    // listener that needs to flush, which keeps it at stopping.
    let target = if meta.status == StreamStatus::Started
        && global.registry.lookup(meta_id).await.is_none()
    {
        StreamStatus::Stopped
    } else {
        StreamStatus::Stopping
    };

    if global.metadata.advance_status(meta_id, target).await? {
        tracing::debug!(meta_id = %meta_id, status = ?target, "stream status advanced");
    } else {
        tracing::debug!(meta_id = %meta_id, status = ?target, "stream status already settled");
    }

    match global.registry.unregister(meta_id).await {
        Some(listener) => {
            if let Err(err) = listener.close().await {
                tracing::warn!(meta_id = %meta_id, error = %err, "listener close failed");
            }
        }
        None if target == StreamStatus::Stopped => {
            tracing::debug!(meta_id = %meta_id, "listener already released by natural end of stream");
        }
        None => {
            let registered = global.registry.keys().await;
            tracing::error!(
                meta_id = %meta_id,
                registered = ?registered,
                "no capture listener registered for the stream",
            );
        }
    }

    Ok(())
}

/// Stops every capture in the initiator's room and finalizes the recording.
///
/// Best-effort. Individual failures are logged and the remaining
/// participants are still processed.
pub async fn stop_room_recording(
    global: &Arc<GlobalState>,
    initiator_id: Uuid,
    explicit_recording_id: Option<Uuid>,
) {
    let Some(initiator) = global.sessions.get(initiator_id).await else {
        tracing::warn!(
            initiator_id = %initiator_id,
            "initiating session not found, cannot stop recording",
        );
        return;
    };

    // An explicitly supplied id wins. The participant triggering the stop is
    // not always the one who started the recording.
    let recording_id = explicit_recording_id.or(initiator.recording_id);

    if let Err(err) = global
        .notifier
        .broadcast(
            initiator.room_id,
            &RoomEvent::RecordingStopped {
                recording_id,
                initiator_id,
            },
        )
        .await
    {
        tracing::warn!(
            room_id = %initiator.room_id,
            error = %err,
            "failed to announce recording stop",
        );
    }

    for participant in global.sessions.list_by_room(initiator.room_id).await {
        if !participant.connected {
            continue;
        }

        if let Err(err) = stop_participant_capture(global, &participant).await {
            tracing::warn!(
                session_id = %participant.id,
                display_name = %participant.display_name,
                error = %err,
                "failed to stop participant capture, continuing with the rest",
            );
        }
    }

    let Some(recording_id) = recording_id else {
        tracing::debug!(initiator_id = %initiator_id, "no recording id to finalize");
        return;
    };

    global
        .sessions
        .update(initiator_id, |session| {
            session.recording = false;
            session.recording_id = None;
        })
        .await;

    if let Err(err) = lifecycle::finalize_recording(global, recording_id, Utc::now()).await {
        tracing::error!(
            recording_id = %recording_id,
            error = %err,
            "failed to finalize recording",
        );
        return;
    }

    tracing::info!(
        recording_id = %recording_id,
        room_id = %initiator.room_id,
        "room recording stopped",
    );
}

/// Stops one participant's capture and stamps the metadata end time.
async fn stop_participant_capture(
    global: &Arc<GlobalState>,
    participant: &ParticipantSession,
) -> Result<()> {
    let Some(kind) = capture::classify(participant) else {
        return Ok(());
    };

    let publish_name = capture::publish_name(participant, kind).unwrap_or_default();

    stop_single_stream(global, participant.room_id, &publish_name, participant.meta_id).await?;

    if let Some(meta_id) = participant.meta_id {
        global.metadata.update_end_time(meta_id, Utc::now()).await?;
    }

    Ok(())
}

/// Stops any capture a leaving participant still owns without touching the
/// rest of the room, then drops their session from the hub.
pub async fn stop_participant_streams(global: &Arc<GlobalState>, session_id: Uuid) {
    let Some(session) = global.sessions.get(session_id).await else {
        tracing::debug!(session_id = %session_id, "session already gone, nothing to stop");
        return;
    };

    if let Err(err) = stop_participant_capture(global, &session).await {
        tracing::warn!(
            session_id = %session_id,
            error = %err,
            "failed to stop capture of a leaving participant",
        );
    }

    global.sessions.remove(session_id).await;
}

/// Attaches a capture for one participant joining a recording already in
/// progress. The recording is looked up fresh so its interview flag and
/// dimensions are respected.
pub async fn record_late_joiner(
    global: &Arc<GlobalState>,
    session_id: Uuid,
    recording_id: Uuid,
) -> Result<()> {
    let session = global
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| anyhow::anyhow!("session {} not found", session_id))?;

    let recording = global
        .recordings
        .get(recording_id)
        .await?
        .ok_or(CaptureError::RecordingGone(recording_id))?;

    let Some(kind) = capture::classify(&session) else {
        tracing::debug!(
            session_id = %session_id,
            "late joiner publishes nothing worth capturing",
        );
        return Ok(());
    };

    let meta_id = capture_participant(global, &session, &recording, kind).await?;

    tracing::debug!(
        session_id = %session_id,
        recording_id = %recording_id,
        meta_id = %meta_id,
        "late joiner capture attached",
    );

    Ok(())
}

/// Returns the first participant in the room flagged as actively recording.
///
/// At most one is expected to be flagged at a time, but that is up to the
/// callers, the scan does not enforce it.
pub async fn find_active_recorder(
    global: &Arc<GlobalState>,
    room_id: Uuid,
) -> Option<ParticipantSession> {
    global
        .sessions
        .list_by_room(room_id)
        .await
        .into_iter()
        .find(|session| session.recording)
}
