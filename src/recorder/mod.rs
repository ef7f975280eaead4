use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::StreamExt;
use serde::Deserialize;
use tokio::select;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::global::GlobalState;

pub mod capture;
pub mod errors;
pub mod lifecycle;
pub mod listener;
pub mod orchestrator;

/// Commands accepted on the recorder subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RecorderCommand {
    StartRecording {
        initiator_id: Uuid,
        name: String,
        comment: Option<String>,
        #[serde(default)]
        interview: bool,
    },
    StopRecording {
        initiator_id: Uuid,
        recording_id: Option<Uuid>,
    },
    RecordLateJoiner {
        session_id: Uuid,
        recording_id: Uuid,
    },
    ParticipantLeft {
        session_id: Uuid,
    },
}

/// Forwards commands from the queue subscription into the recorder loop.
///
/// Malformed payloads are dropped with a warning, the subscription itself
/// stays up.
pub async fn pump_commands(
    nats: async_nats::Client,
    subject: String,
    queue: String,
    commands: mpsc::Sender<RecorderCommand>,
) -> Result<()> {
    let mut subscriber = nats.queue_subscribe(subject, queue).await?;

    while let Some(message) = subscriber.next().await {
        match serde_json::from_slice::<RecorderCommand>(&message.payload) {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed recorder command");
            }
        }
    }

    Ok(())
}

pub async fn run(
    global: Arc<GlobalState>,
    mut commands: mpsc::Receiver<RecorderCommand>,
) -> Result<()> {
    loop {
        select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    return Err(anyhow!("command channel closed"));
                };

                tokio::spawn(handle_command(global.clone(), command));
            },
            _ = global.ctx.done() => {
                return Ok(());
            }
        }
    }
}

async fn handle_command(global: Arc<GlobalState>, command: RecorderCommand) {
    match command {
        RecorderCommand::StartRecording {
            initiator_id,
            name,
            comment,
            interview,
        } => {
            orchestrator::start_room_recording(&global, initiator_id, &name, comment, interview)
                .await;
        }
        RecorderCommand::StopRecording {
            initiator_id,
            recording_id,
        } => {
            orchestrator::stop_room_recording(&global, initiator_id, recording_id).await;
        }
        RecorderCommand::RecordLateJoiner {
            session_id,
            recording_id,
        } => {
            if let Err(err) =
                orchestrator::record_late_joiner(&global, session_id, recording_id).await
            {
                tracing::warn!(
                    session_id = %session_id,
                    recording_id = %recording_id,
                    error = %err,
                    "failed to record late joiner",
                );
            }
        }
        RecorderCommand::ParticipantLeft { session_id } => {
            orchestrator::stop_participant_streams(&global, session_id).await;
        }
    }
}
