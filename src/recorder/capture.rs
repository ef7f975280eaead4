use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::session::{AvSettings, ParticipantSession};

/// What a participant's capture records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Screen,
    AudioVideo,
    AudioOnly,
}

impl CaptureKind {
    pub fn is_screen_share(self) -> bool {
        matches!(self, Self::Screen)
    }

    pub fn is_audio_only(self) -> bool {
        matches!(self, Self::AudioOnly)
    }
}

/// Decides whether a participant's publish is worth capturing.
///
/// Screen clients count only once their share actually started. Video
/// without audio is the one main-publish flavor that is not captured,
/// while audio without video is.
pub fn classify(session: &ParticipantSession) -> Option<CaptureKind> {
    if session.screen_client {
        return session.screen_publish_started.then_some(CaptureKind::Screen);
    }

    match session.av {
        AvSettings::AudioVideo => Some(CaptureKind::AudioVideo),
        AvSettings::AudioOnly => Some(CaptureKind::AudioOnly),
        AvSettings::VideoOnly | AvSettings::None => None,
    }
}

/// The publish name carrying the media for the given capture kind.
pub fn publish_name(session: &ParticipantSession, kind: CaptureKind) -> Option<String> {
    match kind {
        CaptureKind::Screen => session.screen_publish_name.clone(),
        _ => session.broadcast_id.clone(),
    }
}

/// Base name of the capture file. The conversion pipeline parses this
/// format back apart, so the shape is a contract.
pub fn file_base_name(recording_id: Uuid, stream_id: Uuid, at: DateTime<Utc>) -> String {
    format!(
        "rec_{}_stream_{}_{}",
        recording_id,
        stream_id,
        at.format("%d%m%Y%H%M%S")
    )
}
