use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{Recording, RecordingStatus, StreamMetadata, StreamStatus};

/// Persistence for recording rows.
#[async_trait]
pub trait RecordingStore: Send + Sync + 'static {
    async fn create(&self, recording: &Recording) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Recording>>;
    /// Stamps the end time and marks the recording completed.
    async fn update_end_time(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<()>;
}

/// Persistence for per-stream metadata rows.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    async fn create(&self, metadata: &StreamMetadata) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<StreamMetadata>>;
    /// Moves the stream status forward. Returns false when the row already
    /// holds `status` or a later one, so racing writers settle quietly.
    async fn advance_status(&self, id: Uuid, status: StreamStatus) -> Result<bool>;
    async fn update_end_time(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<()>;
}

pub struct PgRecordingStore {
    db: Arc<sqlx::PgPool>,
}

impl PgRecordingStore {
    pub fn new(db: Arc<sqlx::PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordingStore for PgRecordingStore {
    async fn create(&self, recording: &Recording) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recordings (
                id,
                owner_id,
                room_id,
                name,
                comment,
                interview,
                width,
                height,
                status,
                start_time,
                end_time
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            )
            "#,
        )
        .bind(recording.id)
        .bind(recording.owner_id)
        .bind(recording.room_id)
        .bind(&recording.name)
        .bind(&recording.comment)
        .bind(recording.interview)
        .bind(recording.width)
        .bind(recording.height)
        .bind(recording.status)
        .bind(recording.start_time)
        .bind(recording.end_time)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Recording>> {
        let recording = sqlx::query_as(
            r#"
            SELECT * FROM recordings WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.as_ref())
        .await?;

        Ok(recording)
    }

    async fn update_end_time(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE recordings
            SET
                end_time = $2,
                status = $3
            WHERE
                id = $1
            "#,
        )
        .bind(id)
        .bind(end_time)
        .bind(RecordingStatus::Completed)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }
}

pub struct PgMetadataStore {
    db: Arc<sqlx::PgPool>,
}

impl PgMetadataStore {
    pub fn new(db: Arc<sqlx::PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn create(&self, metadata: &StreamMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stream_metadata (
                id,
                recording_id,
                participant_name,
                audio_only,
                video_only,
                screen_share,
                file_base_name,
                interview_pod,
                status,
                start_time,
                end_time
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            )
            "#,
        )
        .bind(metadata.id)
        .bind(metadata.recording_id)
        .bind(&metadata.participant_name)
        .bind(metadata.audio_only)
        .bind(metadata.video_only)
        .bind(metadata.screen_share)
        .bind(&metadata.file_base_name)
        .bind(metadata.interview_pod)
        .bind(metadata.status)
        .bind(metadata.start_time)
        .bind(metadata.end_time)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StreamMetadata>> {
        let metadata = sqlx::query_as(
            r#"
            SELECT * FROM stream_metadata WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.as_ref())
        .await?;

        Ok(metadata)
    }

    async fn advance_status(&self, id: Uuid, status: StreamStatus) -> Result<bool> {
        // The enum values are declared in lifecycle order, so `<` rejects
        // any write that would move a status backwards.
        let result = sqlx::query(
            r#"
            UPDATE stream_metadata
            SET
                status = $2
            WHERE
                id = $1 AND
                status < $2
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(self.db.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_end_time(&self, id: Uuid, end_time: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE stream_metadata
            SET
                end_time = $2
            WHERE
                id = $1
            "#,
        )
        .bind(id)
        .bind(end_time)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }
}
