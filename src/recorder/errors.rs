use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("participant has no publish name for the capture")]
    MissingPublishName,
    #[error("stream is not live: {0}")]
    StreamGone(String),
    #[error("recording no longer exists: {0}")]
    RecordingGone(Uuid),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
