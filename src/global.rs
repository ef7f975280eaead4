use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_nats::ServerAddr;
use sqlx::ConnectOptions;
use sqlx_postgres::PgConnectOptions;

use crate::config::AppConfig;
use crate::context::Context;
use crate::convert::{ConversionDispatch, NatsConversionDispatch};
use crate::media::StreamHub;
use crate::notify::{NatsNotifier, RoomNotifier};
use crate::registry::ListenerRegistry;
use crate::session::SessionHub;
use crate::store::{MetadataStore, PgMetadataStore, PgRecordingStore, RecordingStore};

pub struct GlobalState {
    pub config: AppConfig,
    pub ctx: Context,
    pub media: StreamHub,
    pub sessions: SessionHub,
    pub registry: ListenerRegistry,
    pub recordings: Arc<dyn RecordingStore>,
    pub metadata: Arc<dyn MetadataStore>,
    pub notifier: Arc<dyn RoomNotifier>,
    pub converter: Arc<dyn ConversionDispatch>,
}

impl GlobalState {
    pub async fn new(ctx: Context, config: AppConfig) -> Result<(Self, async_nats::Client)> {
        let db = Arc::new(
            sqlx::PgPool::connect_with(
                PgConnectOptions::from_str(&config.database.uri)?
                    .disable_statement_logging()
                    .to_owned(),
            )
            .await?,
        );

        let nats = {
            let mut options = async_nats::ConnectOptions::new()
                .connection_timeout(Duration::from_secs(5))
                .name(&config.name)
                .retry_on_initial_connect();

            if let Some(user) = &config.nats.username {
                options = options.user_and_password(
                    user.clone(),
                    config.nats.password.clone().unwrap_or_default(),
                )
            } else if let Some(token) = &config.nats.token {
                options = options.token(token.clone())
            }

            options
                .connect(
                    config
                        .nats
                        .servers
                        .iter()
                        .map(|s| s.parse::<ServerAddr>())
                        .collect::<Result<Vec<_>, _>>()?,
                )
                .await?
        };

        let global = Self {
            ctx,
            media: StreamHub::new(),
            sessions: SessionHub::new(),
            registry: ListenerRegistry::new(),
            recordings: Arc::new(PgRecordingStore::new(db.clone())),
            metadata: Arc::new(PgMetadataStore::new(db)),
            notifier: Arc::new(NatsNotifier::new(
                nats.clone(),
                config.recorder.events_prefix.clone(),
            )),
            converter: Arc::new(NatsConversionDispatch::new(
                nats.clone(),
                config.recorder.conversion_subject.clone(),
            )),
            config,
        };

        Ok((global, nats))
    }
}
