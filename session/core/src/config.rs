//! Client Configuration
//!
//! Where the prediction API and the chat endpoint live, and how long to wait
//! for them.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! The file lives at `$XDG_CONFIG_HOME/illness-insight/client.toml`
//! (typically `~/.config/illness-insight/client.toml`). A missing file is not
//! an error.
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! url = "http://localhost:8000"
//! request_timeout_ms = 30000
//!
//! [chat]
//! url = "ws://localhost:8000/ws/chat"
//! connect_timeout_ms = 5000
//! greeting = "Hello! Ask me about health tips or about diseases!"
//! ```
//!
//! # Environment Variables
//!
//! - `INSIGHT_API_URL`: prediction API base URL
//! - `INSIGHT_CHAT_URL`: chat WebSocket endpoint
//! - `INSIGHT_CONNECT_TIMEOUT`: chat connect timeout in ms
//! - `INSIGHT_REQUEST_TIMEOUT`: API request timeout in ms

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default prediction API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Default chat endpoint
pub const DEFAULT_CHAT_URL: &str = "ws://localhost:8000/ws/chat";
/// Default chat connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
/// Default API request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Greeting shown by chat surfaces before the first turn
pub const DEFAULT_GREETING: &str =
    "Hello! I'm your Health assistant. Ask me about health tips or about diseases!";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    #[default]
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[api]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// Prediction API base URL
    pub url: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// `[chat]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Chat WebSocket endpoint
    pub url: Option<String>,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
    /// Banner shown before the first turn
    pub greeting: Option<String>,
}

/// Root of the TOML configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Prediction API settings
    pub api: ApiToml,
    /// Chat settings
    pub chat: ChatToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Resolved prediction API settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Resolved chat settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatConfig {
    /// WebSocket endpoint
    pub url: String,
    /// Handshake timeout
    pub connect_timeout: Duration,
    /// Banner shown before the first turn; never part of the exchange log
    pub greeting: String,
    /// Capacity of the transport event channel
    pub event_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CHAT_URL.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            greeting: DEFAULT_GREETING.to_string(),
            event_capacity: 100,
        }
    }
}

/// Where the two endpoints were taken from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigSources {
    /// Source of [`ApiConfig::url`]
    pub api_url: ConfigSource,
    /// Source of [`ChatConfig::url`]
    pub chat_url: ConfigSource,
}

/// Fully resolved client configuration
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Prediction API settings
    pub api: ApiConfig,
    /// Chat settings
    pub chat: ChatConfig,
    /// Provenance of the endpoint values
    pub sources: ConfigSources,
    /// Config file that was read, if one existed
    pub file: Option<PathBuf>,
}

/// Values supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
    /// `--api-url`
    pub api_url: Option<String>,
    /// `--url` / `--chat-url`
    pub chat_url: Option<String>,
}

/// Default config file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("illness-insight").join("client.toml"))
}

/// Parse a config file
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config_from_path(path: &Path) -> Result<ClientToml, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Load configuration from file, process environment and CLI overrides
///
/// An explicitly given config path must exist; the default one may not.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed, or a resolved value
/// is invalid.
pub fn load_config(overrides: &ConfigOverrides) -> Result<ClientConfig, ConfigError> {
    let (file, path) = match &overrides.config_path {
        Some(path) => (load_config_from_path(path)?, Some(path.clone())),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => (load_config_from_path(&path)?, Some(path)),
            None => (ClientToml::default(), None),
        },
    };

    if let Some(ref path) = path {
        tracing::debug!(path = ?path, "Loaded config file");
    }

    let mut config = resolve(&file, |key| std::env::var(key).ok(), overrides)?;
    config.file = path;
    Ok(config)
}

/// Merge the layers. `env` looks up one environment variable.
///
/// # Errors
///
/// Returns an error if a numeric environment value does not parse or the
/// merged result fails validation.
pub fn resolve(
    file: &ClientToml,
    env: impl Fn(&str) -> Option<String>,
    overrides: &ConfigOverrides,
) -> Result<ClientConfig, ConfigError> {
    let (api_url, api_source) = pick(
        overrides.api_url.clone(),
        env("INSIGHT_API_URL"),
        file.api.url.clone(),
        DEFAULT_API_URL,
    );
    let (chat_url, chat_source) = pick(
        overrides.chat_url.clone(),
        env("INSIGHT_CHAT_URL"),
        file.chat.url.clone(),
        DEFAULT_CHAT_URL,
    );

    let request_timeout_ms = env_millis(&env, "INSIGHT_REQUEST_TIMEOUT")?
        .or(file.api.request_timeout_ms)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
    let connect_timeout_ms = env_millis(&env, "INSIGHT_CONNECT_TIMEOUT")?
        .or(file.chat.connect_timeout_ms)
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS);

    let config = ClientConfig {
        api: ApiConfig {
            url: api_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
        },
        chat: ChatConfig {
            url: chat_url,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            greeting: file
                .chat
                .greeting
                .clone()
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            ..ChatConfig::default()
        },
        sources: ConfigSources {
            api_url: api_source,
            chat_url: chat_source,
        },
        file: None,
    };

    config.validate()?;
    Ok(config)
}

impl ClientConfig {
    /// Check URLs and timeouts
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_scheme("api url", &self.api.url, &["http", "https"])?;
        // tokio-tungstenite is built without TLS, so only plain ws is usable.
        check_scheme("chat url", &self.chat.url, &["ws"])?;

        if self.api.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.chat.connect_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn pick(
    cli: Option<String>,
    env: Option<String>,
    file: Option<String>,
    default: &str,
) -> (String, ConfigSource) {
    if let Some(value) = cli {
        (value, ConfigSource::Cli)
    } else if let Some(value) = env {
        (value, ConfigSource::Env)
    } else if let Some(value) = file {
        (value, ConfigSource::File)
    } else {
        (default.to_string(), ConfigSource::Default)
    }
}

fn env_millis(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, ConfigError> {
    env(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::ValidationError(format!("{key} must be milliseconds, got {raw:?}"))
            })
        })
        .transpose()
}

fn check_scheme(what: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{what} {value:?}: {e}")))?;
    if allowed.contains(&parsed.scheme()) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{what} {value:?} must use {}",
            allowed.join(" or ")
        )))
    }
}
