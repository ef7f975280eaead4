use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// Mix every captured stream into one output
    Standard,
    /// Per-pod outputs for interview rooms
    Interview,
}

/// Work order handed to the conversion workers once a recording finalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    pub recording_id: Uuid,
    pub kind: ConversionKind,
}

#[async_trait]
pub trait ConversionDispatch: Send + Sync + 'static {
    async fn start_standard_conversion(&self, recording_id: Uuid) -> Result<()>;
    async fn start_interview_conversion(&self, recording_id: Uuid) -> Result<()>;
}

/// Hands conversion jobs to the workers over NATS.
pub struct NatsConversionDispatch {
    nats: async_nats::Client,
    subject: String,
}

impl NatsConversionDispatch {
    pub fn new(nats: async_nats::Client, subject: String) -> Self {
        Self { nats, subject }
    }

    async fn dispatch(&self, job: ConversionJob) -> Result<()> {
        self.nats
            .publish(self.subject.clone(), serde_json::to_vec(&job)?.into())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ConversionDispatch for NatsConversionDispatch {
    async fn start_standard_conversion(&self, recording_id: Uuid) -> Result<()> {
        self.dispatch(ConversionJob {
            recording_id,
            kind: ConversionKind::Standard,
        })
        .await
    }

    async fn start_interview_conversion(&self, recording_id: Uuid) -> Result<()> {
        self.dispatch(ConversionJob {
            recording_id,
            kind: ConversionKind::Interview,
        })
        .await
    }
}
