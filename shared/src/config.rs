//! Realtime client configuration
//!
//! Timing constants and endpoint paths for the dashboard client. Values can
//! be supplied as TOML or JSON; every field has a default so partial
//! documents are accepted.

use serde::{Deserialize, Serialize};

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Settings for the realtime client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Context path the UI backend is mounted under (e.g. "/insight-ui")
    pub base_path: String,

    /// WebSocket path below `base_path`
    ///
    /// The backend registers a SockJS endpoint at `/ws`; SockJS exposes the
    /// raw WebSocket transport at `/ws/websocket`.
    pub ws_path: String,

    /// Fixed delay before every reconnect attempt
    pub reconnect_delay_ms: u32,

    /// Interval of the fallback poller while the live channel is down
    pub poll_interval_ms: u32,

    /// Default lifetime of a toast
    pub toast_duration_ms: u32,

    /// How long a changed stat value stays highlighted
    pub highlight_ms: u32,

    /// How long the error counter pulses after an alert
    pub pulse_ms: u32,

    /// Delay before the "ready" toast after startup
    pub welcome_delay_ms: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_path: "/insight-ui".to_string(),
            ws_path: "/ws/websocket".to_string(),
            reconnect_delay_ms: 5_000,
            poll_interval_ms: 30_000,
            toast_duration_ms: 5_000,
            highlight_ms: 1_000,
            pulse_ms: 1_000,
            welcome_delay_ms: 1_000,
        }
    }
}

impl RealtimeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a page-supplied configuration, JSON object or TOML document
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.trim_start().starts_with('{') {
            Self::from_json(s)
        } else {
            Self::from_toml(s)
        }
    }

    /// Override the polling interval
    pub fn with_poll_interval(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Check that all intervals are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("toast_duration_ms", self.toast_duration_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "base_path",
                reason: format!("'{}' must start with '/'", self.base_path),
            });
        }

        if !self.ws_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "ws_path",
                reason: format!("'{}' must start with '/'", self.ws_path),
            });
        }

        Ok(())
    }

    /// URL of a REST endpoint, relative to the page origin
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_path.trim_end_matches('/'), path)
    }

    /// WebSocket URL derived from the page origin
    /// (e.g. "https://host:8080" becomes "wss://host:8080/insight-ui/ws/websocket")
    pub fn ws_url(&self, origin: &str) -> String {
        let origin = if let Some(rest) = origin.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = origin.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            origin.to_string()
        };

        format!(
            "{}{}{}",
            origin.trim_end_matches('/'),
            self.base_path.trim_end_matches('/'),
            self.ws_path
        )
    }
}
