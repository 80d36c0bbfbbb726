//! Configuration for the Scrybe collector.

use crate::core::tracker::BehavioralConfig;
use crate::fingerprint::DEFAULT_FONT_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration consumed by the orchestrator.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the ingestion gateway
    pub api_url: String,

    /// Shared HMAC key. Never logged.
    pub api_key: String,

    /// Explicit consent decision; `None` defers to the stored record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_given: Option<bool>,

    /// Suppress collection entirely when the visitor sends Do-Not-Track
    #[serde(default = "default_true")]
    pub respect_do_not_track: bool,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,

    /// Transport timeout, serialized in milliseconds
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub timeout: Duration,

    #[serde(default)]
    pub behavioral: BehavioralConfig,

    /// Metric difference above which a font counts as installed
    #[serde(default = "default_font_tolerance")]
    pub font_tolerance: f64,
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> Duration {
    Duration::from_millis(5_000)
}

fn default_font_tolerance() -> f64 {
    DEFAULT_FONT_TOLERANCE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            consent_given: None,
            respect_do_not_track: true,
            debug: false,
            timeout: default_timeout(),
            behavioral: BehavioralConfig::default(),
            font_tolerance: DEFAULT_FONT_TOLERANCE,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("consent_given", &self.consent_given)
            .field("respect_do_not_track", &self.respect_do_not_track)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("behavioral", &self.behavioral)
            .field("font_tolerance", &self.font_tolerance)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrybe")
            .join("config.json")
    }

    /// Check that the gateway can be reached and requests can be signed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("apiUrl is not set".to_string()));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "apiUrl must be an http(s) URL, got '{url}'"
            )));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid("apiKey is not set".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be positive".to_string()));
        }
        if !self.font_tolerance.is_finite() || self.font_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fontTolerance must be a non-negative number, got {}",
                self.font_tolerance
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
