//! Server configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use fableroom_narrator::{DEFAULT_MODEL, OpenAiNarrator, ScriptedNarrator};
use fableroom_room::{JsonFileStore, MemoryStore, RoomConfig};

use crate::{AnyNarrator, AnyStore, FableroomError};

/// A setting in the environment that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },

    #[error("{key} must be at most {max} seconds, got {value}")]
    TooLarge { key: &'static str, value: u64, max: u64 },
}

/// Upper bound for every duration setting: one week.
const MAX_SECS: u64 = 7 * 24 * 60 * 60;

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `FABLEROOM_BIND`
    pub bind: String,
    /// `FABLEROOM_VOTING_SECS`
    pub voting_window: Duration,
    /// `FABLEROOM_NARRATION_TIMEOUT_SECS`
    pub narration_timeout: Duration,
    /// `FABLEROOM_STORE_DIR`; rooms live in memory when unset.
    pub store_dir: Option<PathBuf>,
    /// `OPENAI_API_KEY`; the scripted narrator is used when unset.
    pub openai_api_key: Option<String>,
    /// `OPENAI_MODEL`
    pub openai_model: String,
    /// `OPENAI_BASE_URL`
    pub openai_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let room = RoomConfig::default();
        Self {
            bind: "127.0.0.1:8080".to_string(),
            voting_window: room.voting_window,
            narration_timeout: room.narration_timeout,
            store_dir: None,
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: None,
        }
    }
}

impl ServerConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            bind: get("FABLEROOM_BIND").unwrap_or(defaults.bind),
            voting_window: seconds(get("FABLEROOM_VOTING_SECS"), "FABLEROOM_VOTING_SECS")?
                .unwrap_or(defaults.voting_window),
            narration_timeout: seconds(
                get("FABLEROOM_NARRATION_TIMEOUT_SECS"),
                "FABLEROOM_NARRATION_TIMEOUT_SECS",
            )?
            .unwrap_or(defaults.narration_timeout),
            store_dir: get("FABLEROOM_STORE_DIR").map(PathBuf::from),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: get("OPENAI_BASE_URL"),
        })
    }

    /// Room settings derived from this config.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            voting_window: self.voting_window,
            narration_timeout: self.narration_timeout,
            ..RoomConfig::default()
        }
    }

    /// The OpenAI narrator when a key is configured, the scripted one
    /// otherwise.
    pub fn narrator(&self) -> AnyNarrator {
        match &self.openai_api_key {
            Some(key) => {
                let mut narrator = OpenAiNarrator::new(key).with_model(&self.openai_model);
                if let Some(base_url) = &self.openai_base_url {
                    narrator = narrator.with_base_url(base_url);
                }
                AnyNarrator::OpenAi(narrator)
            }
            None => AnyNarrator::Scripted(ScriptedNarrator::default()),
        }
    }

    /// A file store under `store_dir`, or an in-memory store.
    pub async fn store(&self) -> Result<AnyStore, FableroomError> {
        Ok(match &self.store_dir {
            Some(dir) => AnyStore::File(JsonFileStore::open(dir).await?),
            None => AnyStore::Memory(MemoryStore::new()),
        })
    }
}

fn seconds(value: Option<String>, key: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let secs: u64 = value
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { key, value })?;
    if secs == 0 {
        return Err(ConfigError::Zero { key });
    }
    if secs > MAX_SECS {
        return Err(ConfigError::TooLarge {
            key,
            value: secs,
            max: MAX_SECS,
        });
    }
    Ok(Some(Duration::from_secs(secs)))
}
