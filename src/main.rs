use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use room_recorder::{config, context, global, logging, recorder, signal};
use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;
use tokio::{select, time};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::AppConfig::parse()?;

    logging::init(&config.logging.level, config.logging.json)?;

    tracing::debug!("config: {:#?}", config);

    let (ctx, handler) = context::Context::new();

    let (global, nats) = global::GlobalState::new(ctx, config).await?;
    let global = Arc::new(global);

    let (command_tx, command_rx) = mpsc::channel(64);

    let pump_future = tokio::spawn(recorder::pump_commands(
        nats,
        global.config.recorder.command_subject.clone(),
        global.config.recorder.command_queue.clone(),
        command_tx,
    ));

    let recorder_future = tokio::spawn(recorder::run(global.clone(), command_rx));

    // Listen on both sigint and sigterm and cancel the context when either is received
    let mut signal_handler = signal::SignalHandler::new()
        .with_signal(SignalKind::interrupt())
        .with_signal(SignalKind::terminate());

    select! {
        r = pump_future => tracing::error!("command pump stopped unexpectedly: {:?}", r),
        r = recorder_future => tracing::error!("recorder stopped unexpectedly: {:?}", r),
        _ = signal_handler.recv() => tracing::info!("shutting down"),
    }

    // We cannot have a context in scope when we cancel the handler, otherwise it will deadlock.
    drop(global);

    // Cancel the context
    tracing::info!("waiting for tasks to finish");

    select! {
        _ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
        _ = signal_handler.recv() => tracing::warn!("force shutting down"),
        _ = handler.cancel() => tracing::info!("shutting down"),
    }

    Ok(())
}
