use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{Recording, RecordingStatus};
use crate::global::GlobalState;
use crate::session::ParticipantSession;

/// Interview recordings are converted into fixed-size pod tiles, so the
/// negotiated camera resolution is ignored for them.
pub const INTERVIEW_WIDTH: i32 = 320;
pub const INTERVIEW_HEIGHT: i32 = 260;

/// Inserts the recording row for a room-level start.
pub async fn create_recording(
    global: &Arc<GlobalState>,
    initiator: &ParticipantSession,
    name: &str,
    comment: Option<String>,
    interview: bool,
) -> Result<Recording> {
    let (width, height) = if interview {
        (INTERVIEW_WIDTH, INTERVIEW_HEIGHT)
    } else {
        (initiator.video_width, initiator.video_height)
    };

    let recording = Recording {
        id: Uuid::new_v4(),
        owner_id: initiator.effective_owner(),
        room_id: initiator.room_id,
        name: name.to_string(),
        comment,
        interview,
        width,
        height,
        status: RecordingStatus::Recording,
        start_time: Utc::now(),
        end_time: None,
    };

    global.recordings.create(&recording).await?;

    Ok(recording)
}

/// Stamps the end time, marks the recording completed and hands it to the
/// matching conversion path.
pub async fn finalize_recording(
    global: &Arc<GlobalState>,
    recording_id: Uuid,
    end_time: DateTime<Utc>,
) -> Result<()> {
    global.recordings.update_end_time(recording_id, end_time).await?;

    match global.recordings.get(recording_id).await? {
        Some(recording) => {
            if recording.interview {
                global.converter.start_interview_conversion(recording_id).await?;
            } else {
                global.converter.start_standard_conversion(recording_id).await?;
            }
        }
        None => {
            tracing::warn!(recording_id = %recording_id, "recording vanished before conversion dispatch");
        }
    }

    Ok(())
}
