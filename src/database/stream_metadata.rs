use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Capture status of a single stream.
///
/// Declared in the same order as the `stream_status` database enum so the
/// forward-only rule can be enforced with a plain comparison there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "stream_status")]
pub enum StreamStatus {
    /// Metadata exists but no sample has been captured yet
    #[sqlx(rename = "none")]
    None,
    /// The capture is live
    #[sqlx(rename = "started")]
    Started,
    /// A stop was requested while a listener was still attached
    #[sqlx(rename = "stopping")]
    Stopping,
    /// The capture is fully flushed
    #[sqlx(rename = "stopped")]
    Stopped,
}

impl StreamStatus {
    fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Started => 1,
            Self::Stopping => 2,
            Self::Stopped => 3,
        }
    }

    /// Statuses only ever move forward, never back to an earlier state.
    pub fn can_advance_to(self, next: StreamStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// One row per individual captured stream. A participant publishing both
/// audio/video and a screen share owns two of these.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StreamMetadata {
    /// The unique id of the stream capture
    pub id: Uuid,
    /// The recording this stream belongs to
    pub recording_id: Uuid,
    /// Display name of the captured participant
    pub participant_name: String,
    /// The stream carries audio without video
    pub audio_only: bool,
    /// The stream carries video without audio
    pub video_only: bool,
    /// The stream is a screen share
    pub screen_share: bool,
    /// Base name of the capture file, consumed by the conversion pipeline
    pub file_base_name: String,
    /// Interview pod the participant occupied, if any
    pub interview_pod: Option<i32>,
    /// Capture status of the stream
    pub status: StreamStatus,
    /// When the capture was requested
    pub start_time: DateTime<Utc>,
    /// When the stream was stopped (null while capture is still running)
    pub end_time: Option<DateTime<Utc>>,
}
