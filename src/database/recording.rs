use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "recording_status")]
pub enum RecordingStatus {
    #[sqlx(rename = "recording")]
    Recording,
    #[sqlx(rename = "completed")]
    Completed,
}

/// One logical capture session for a room, aggregating any number of
/// per-participant streams.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recording {
    /// The unique id of the recording
    pub id: Uuid,
    /// The user the recording is attributed to (null for anonymous initiators)
    pub owner_id: Option<Uuid>,
    /// The room the recording was made in
    pub room_id: Uuid,
    /// Display name of the recording
    pub name: String,
    /// Free-form comment supplied by the initiator
    pub comment: Option<String>,
    /// Whether the recording was made in interview mode
    pub interview: bool,
    /// Output width the conversion pipeline renders to
    pub width: i32,
    /// Output height the conversion pipeline renders to
    pub height: i32,
    /// Capture status of the recording
    pub status: RecordingStatus,
    /// When the recording was started
    pub start_time: DateTime<Utc>,
    /// When the recording ended (null while capture is still running)
    pub end_time: Option<DateTime<Utc>>,
}
