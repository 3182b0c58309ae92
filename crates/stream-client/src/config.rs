//! Stream client configuration.
//!
//! Loaded from TOML, then overlaid by environment variables:
//!
//! ```toml
//! base_url = "ws://localhost:8765/stream"
//! channels = ["market", "portfolio", "orders", "system"]
//! connect_timeout = "10s"
//! event_capacity = 256
//!
//! [reconnect]
//! enabled = true
//! base_delay = "500ms"
//! max_delay = "30s"
//! max_attempts = 10
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `OC_STREAM_URL` | `base_url` |
//! | `OC_STREAM_RECONNECT` | `reconnect.enabled` |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::Channel;
use thiserror::Error;

use crate::ports::{ExponentialBackoff, NoReconnect, ReconnectPolicy};

/// Environment variable overriding `base_url`.
pub const ENV_STREAM_URL: &str = "OC_STREAM_URL";
/// Environment variable overriding `reconnect.enabled`.
pub const ENV_STREAM_RECONNECT: &str = "OC_STREAM_RECONNECT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for every channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Channel addresses are `{base_url}/{channel}`.
    pub base_url: String,
    /// Channels to connect.
    pub channels: Vec<Channel>,
    /// Handshake timeout. `None` waits indefinitely.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,
    /// Buffered connection state events per receiver.
    pub event_capacity: usize,
    pub reconnect: ReconnectConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "ws://localhost:8765/stream".to_string(),
            channels: Channel::ALL.to_vec(),
            connect_timeout: Some(Duration::from_secs(10)),
            event_capacity: 256,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Reconnection settings. Disabled by default: a closed channel stays closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl StreamConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Overlay `OC_STREAM_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Overlay variables resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STREAM_URL) {
            self.base_url = url;
        }
        if let Some(value) = lookup(ENV_STREAM_RECONNECT) {
            self.reconnect.enabled = parse_flag(&value).ok_or(ConfigError::InvalidEnv {
                var: ENV_STREAM_RECONNECT,
                value,
            })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("ws://") || self.base_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be a ws:// or wss:// URL, got {:?}",
                self.base_url
            )));
        }

        if self.channels.is_empty() {
            return Err(ConfigError::Invalid("at least one channel is required".into()));
        }

        for (i, channel) in self.channels.iter().enumerate() {
            if self.channels[..i].contains(channel) {
                return Err(ConfigError::Invalid(format!("channel {channel} listed twice")));
            }
        }

        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity cannot be 0".into()));
        }

        if self.connect_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid("connect_timeout cannot be 0".into()));
        }

        if self.reconnect.enabled {
            if self.reconnect.base_delay.is_zero() {
                return Err(ConfigError::Invalid("reconnect.base_delay cannot be 0".into()));
            }
            if self.reconnect.max_delay < self.reconnect.base_delay {
                return Err(ConfigError::Invalid(
                    "reconnect.max_delay must not be below reconnect.base_delay".into(),
                ));
            }
        }

        Ok(())
    }

    /// Address of `channel`'s connection.
    #[must_use]
    pub fn address_for(&self, channel: Channel) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), channel)
    }

    /// Reconnection policy described by `reconnect`.
    #[must_use]
    pub fn reconnect_policy(&self) -> Arc<dyn ReconnectPolicy> {
        if self.reconnect.enabled {
            Arc::new(ExponentialBackoff::new(
                self.reconnect.base_delay,
                self.reconnect.max_delay,
                self.reconnect.max_attempts,
            ))
        } else {
            Arc::new(NoReconnect)
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
