use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level to use, this is a tracing env filter
    pub level: String,

    /// If we should use JSON logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// The database URL to use
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost:5432/recorder".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NatsConfig {
    /// The addresses of the NATS servers
    pub servers: Vec<String>,

    /// The username to use for authentication (user-pass auth)
    pub username: Option<String>,

    /// The password to use for authentication (user-pass auth)
    pub password: Option<String>,

    /// The token to use for authentication (token auth)
    pub token: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["localhost:4222".to_string()],
            username: None,
            password: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory capture files are written to
    pub output_dir: PathBuf,

    /// Subject the recorder receives commands on
    pub command_subject: String,

    /// Queue group for the command subscription
    pub command_queue: String,

    /// Subject prefix for room event broadcasts
    pub events_prefix: String,

    /// Subject conversion jobs are published to
    pub conversion_subject: String,

    /// Capacity of the per-capture sample channel
    pub sample_channel_size: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            command_subject: "recorder.commands".to_string(),
            command_queue: "room-recorder".to_string(),
            events_prefix: "room.events".to_string(),
            conversion_subject: "recorder.convert".to_string(),
            sample_channel_size: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Name of this instance
    pub name: String,

    /// The path to the config file.
    pub config_file: String,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// NATS configuration
    pub nats: NatsConfig,

    /// Recorder configuration
    pub recorder: RecorderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "room-recorder".to_string(),
            config_file: "config".to_string(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            nats: NatsConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Layers an optional config file under `REC_`-prefixed environment
    /// variables (`__` separates nested keys, e.g. `REC_LOGGING__LEVEL`).
    /// `REC_CONFIG_FILE` selects the file.
    pub fn parse() -> Result<Self> {
        let config_file = std::env::var("REC_CONFIG_FILE")
            .unwrap_or_else(|_| AppConfig::default().config_file);

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name(&config_file).required(false))
            .add_source(
                ::config::Environment::with_prefix("REC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
