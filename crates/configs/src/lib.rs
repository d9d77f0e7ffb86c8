//! # configs
//!
//! Layered settings: built-in defaults, then `config/default.toml`, then
//! `config/local.toml`, then `.env` and `BOARD__*` environment variables
//! (e.g. `BOARD__SERVER__PORT=9000`, `BOARD__BOARD__BANNED_WORDS=a,b`).

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Content limits and copy. Retention and rate-limit policy are fixed in
/// the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub default_topic: String,
    pub max_name_len: usize,
    pub max_content_len: usize,
    pub max_topic_len: usize,
    pub banned_words: Vec<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            default_topic: "No topic yet".to_string(),
            max_name_len: 25,
            max_content_len: 100,
            max_topic_len: 100,
            banned_words: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    /// HMAC key for identity cookies. When unset the binary generates one
    /// per process, so remembered identities do not survive a restart.
    pub secret: Option<SecretString>,
    /// Adds the `Secure` attribute; enable behind HTTPS.
    pub secure: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Postgres URL. Unset means in-memory storage.
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub board: BoardSettings,
    pub cookie: CookieSettings,
    pub database: DatabaseSettings,
    pub log: LogSettings,
}

/// Loads settings from all layers. A missing `.env` or config file is not
/// an error; a malformed one is.
pub fn load() -> Result<Settings, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
    load_from(Environment::with_prefix("BOARD"))
}

fn load_from(env: Environment) -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(
            env.prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("board.banned_words")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Settings>()?;
    Ok(settings)
}
