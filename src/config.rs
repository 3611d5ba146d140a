//! Configuration System using Figment
//!
//! Configuration is assembled from, in order of precedence (highest last):
//! 1. Built-in defaults
//! 2. TOML configuration file (default: `config/harpia.toml`)
//! 3. Environment variables prefixed with `HARPIA_`, with `__` separating
//!    nested keys
//!
//! # Environment Variable Overrides
//!
//! ```text
//! HARPIA_APPLICATION__LOG_LEVEL=debug
//! HARPIA_INSTRUMENT__BASE_URL=http://192.168.1.20:20050/v1/
//! HARPIA_NOTIFIER__BOT_TOKEN=123456:ABC
//! ```
//!
//! # Example
//!
//! ```no_run
//! use harpia_daq::config::HarpiaConfig;
//!
//! let config = HarpiaConfig::load()?;
//! println!("Instrument at {}", config.instrument.base_url);
//! # Ok::<(), harpia_daq::config::ConfigError>(())
//! ```
//!
//! # File Format
//!
//! ```toml
//! [application]
//! name = "transient-absorption"
//! log_level = "info"
//! log_format = "pretty"
//!
//! [instrument]
//! base_url = "http://localhost:20050/v1/"
//! timeout_ms = 30000
//!
//! [notifier]
//! enabled = true
//! bot_token = "123456:ABC"
//! chat_id = "987654321"
//! ```

use crate::connector::DEFAULT_BASE_URL;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/harpia.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "HARPIA_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed or the merged values did not deserialize.
    #[error("Configuration load error: {0}")]
    LoadError(#[from] Box<figment::Error>),
    /// Values deserialized but are not acceptable.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    /// The global tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarpiaConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Instrument API settings
    pub instrument: InstrumentConfig,
    /// Operator notification settings
    pub notifier: NotifierConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name, used as a prefix in operator notifications
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    pub log_format: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "harpia-daq".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Instrument HTTP API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Base URL of the instrument service
    pub base_url: String,
    /// Per-request timeout in milliseconds; unset leaves the HTTP client default
    pub timeout_ms: Option<u64>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
        }
    }
}

/// Telegram notification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Deliver notifications to the messaging service
    pub enabled: bool,
    /// Bot API base URL
    pub api_url: String,
    /// Bot token
    pub bot_token: String,
    /// Destination chat identifier; numeric ids may be given unquoted
    #[serde(deserialize_with = "string_or_int")]
    pub chat_id: String,
}

/// Chat ids are numbers to Telegram but are carried as text. The
/// environment provider hands bare digits over as integers.
fn string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Text(text) => text,
        StringOrInt::Signed(n) => n.to_string(),
        StringOrInt::Unsigned(n) => n.to_string(),
    })
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

impl HarpiaConfig {
    /// Load configuration from `config/harpia.toml` and environment variables.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if the file is malformed or validation fails.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path.as_ref())
            .extract()
            .map_err(|e| ConfigError::LoadError(Box::new(e)))?;

        config.validate()?;
        Ok(config)
    }

    /// The provider stack used by [`HarpiaConfig::load_from`].
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level and log format are known
    /// - Base URL is an http(s) URL
    /// - An enabled notifier has a bot token and a chat id
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if !VALID_LOG_FORMATS.contains(&self.application.log_format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                VALID_LOG_FORMATS.join(", ")
            )));
        }

        let base_url = self.instrument.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid instrument base_url '{}'. Must start with http:// or https://",
                base_url
            )));
        }

        if self.notifier.enabled {
            if self.notifier.bot_token.is_empty() {
                return Err(ConfigError::ValidationError(
                    "Notifier enabled but 'bot_token' is empty".to_string(),
                ));
            }
            if self.notifier.chat_id.is_empty() {
                return Err(ConfigError::ValidationError(
                    "Notifier enabled but 'chat_id' is empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
