//! Server configuration loading from file and environment variables.

use carebell_assistant::AssistantConfig;
use carebell_voice::LiveKitConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// LiveKit credentials for issuing voice join tokens.
    #[serde(default)]
    pub voice: LiveKitConfig,

    /// Chat-completion service behind the assistant.
    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Requests allowed per client IP in each one-minute window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "carebell_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a sign-in session.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_rate_limit() -> u32 {
    120
}

fn default_db_path() -> String {
    "carebell.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_hours() -> i64 {
    carebell_accounts::DEFAULT_SESSION_TTL_HOURS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CAREBELL_HOST`, `CAREBELL_PORT` override `server.host` / `server.port`
/// - `CAREBELL_DB_PATH` overrides `database.path`
/// - `CAREBELL_LOG_LEVEL`, `CAREBELL_LOG_JSON` override `logging.level` / `logging.json`
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET` override `voice.*`
/// - `CAREBELL_COMPLETION_ENDPOINT`, `CAREBELL_COMPLETION_API_KEY` override
///   `assistant.completion_endpoint` / `assistant.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("CAREBELL_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = host;
    }
    if let Some(port) = var("CAREBELL_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    if let Some(db_path) = var("CAREBELL_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("CAREBELL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("CAREBELL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(url) = var("LIVEKIT_URL") {
        config.voice.url = url;
    }
    if let Some(key) = var("LIVEKIT_API_KEY") {
        config.voice.api_key = key;
    }
    if let Some(secret) = var("LIVEKIT_API_SECRET") {
        config.voice.api_secret = secret;
    }
    if let Some(endpoint) = var("CAREBELL_COMPLETION_ENDPOINT") {
        config.assistant.completion_endpoint = endpoint;
    }
    if let Some(key) = var("CAREBELL_COMPLETION_API_KEY") {
        config.assistant.api_key = key;
    }
}
