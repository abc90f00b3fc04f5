//! Configuration file handling for GCodeLink
//!
//! Configuration is read from TOML, by default at
//! `<config dir>/gcodelink/config.toml`, and is organized into sections:
//! - `[connection]`: port, baud rate and firmware family
//! - `[streaming]`: flow control and session timing
//! - `[logging]`: log level and output format
//!
//! Every key is optional; missing keys take their defaults.

use crate::error::{ConfigError, ConfigResult};
use gcodelink_communication::{FirmwareKind, FlowControl, SessionConfig, DEFAULT_RX_BUFFER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port to open when none is given on the command line
    pub port: Option<String>,
    /// Baud rate for serial connections
    pub baud_rate: u32,
    /// Firmware family on the other end of the port
    pub firmware: FirmwareKind,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115200,
            firmware: FirmwareKind::Grbl,
        }
    }
}

/// Flow control policy named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowPolicy {
    /// One command outstanding at a time
    OkCounted,
    /// Commands outstanding while their bytes fit the receive buffer
    ByteCounted,
}

/// Streaming and session timing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Receive buffer size; implies byte-counted flow control when set
    pub buffer_capacity: Option<usize>,
    /// Flow control override; unset uses the firmware's default
    pub flow_control: Option<FlowPolicy>,
    /// Status query period in milliseconds; 0 disables polling
    pub status_poll_ms: u64,
    /// Milliseconds before an unacknowledged command is reported stalled
    pub stall_timeout_ms: u64,
    /// Capacity of each port's event channel
    pub event_channel_capacity: usize,
    /// Capacity of each port's request inbox
    pub inbox_capacity: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: None,
            flow_control: None,
            status_poll_ms: 250,
            stall_timeout_ms: 10_000,
            event_channel_capacity: 256,
            inbox_capacity: 64,
        }
    }
}

impl StreamingSettings {
    /// Flow control override for sessions, if any is configured
    pub fn flow_control_override(&self) -> Option<FlowControl> {
        match (self.flow_control, self.buffer_capacity) {
            (Some(FlowPolicy::OkCounted), _) => Some(FlowControl::OkCounted),
            (Some(FlowPolicy::ByteCounted), capacity) => Some(FlowControl::ByteCounted {
                capacity: capacity.unwrap_or(DEFAULT_RX_BUFFER),
            }),
            (None, Some(capacity)) => Some(FlowControl::ByteCounted { capacity }),
            (None, None) => None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set (e.g. "info", "gcodelink=debug")
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Streaming settings
    pub streaming: StreamingSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration file location
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("gcodelink").join("config.toml"))
            .ok_or(ConfigError::NoConfigDirectory)
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the default configuration file, or defaults when it does not exist
    pub fn load_or_default() -> ConfigResult<Self> {
        let path = match Self::default_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("{}; using defaults", e);
                return Ok(Self::default());
            }
        };
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No configuration at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.baud_rate == 0 {
            return Err(ConfigError::invalid("connection.baud_rate", "must be > 0"));
        }

        let streaming = &self.streaming;
        match (streaming.flow_control, streaming.buffer_capacity) {
            (_, Some(0)) => {
                return Err(ConfigError::invalid(
                    "streaming.buffer_capacity",
                    "must be > 0",
                ));
            }
            (Some(FlowPolicy::OkCounted), Some(_)) => {
                return Err(ConfigError::invalid(
                    "streaming.buffer_capacity",
                    "only applies to byte-counted flow control",
                ));
            }
            _ => {}
        }

        if streaming.stall_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "streaming.stall_timeout_ms",
                "must be > 0",
            ));
        }
        if streaming.event_channel_capacity == 0 {
            return Err(ConfigError::invalid(
                "streaming.event_channel_capacity",
                "must be > 0",
            ));
        }
        if streaming.inbox_capacity == 0 {
            return Err(ConfigError::invalid(
                "streaming.inbox_capacity",
                "must be > 0",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Session defaults for ports opened with this configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            baud_rate: self.connection.baud_rate,
            firmware: self.connection.firmware,
            flow_control: self.streaming.flow_control_override(),
            status_poll_interval: Duration::from_millis(self.streaming.status_poll_ms),
            stall_timeout: Duration::from_millis(self.streaming.stall_timeout_ms),
            event_channel_capacity: self.streaming.event_channel_capacity,
            inbox_capacity: self.streaming.inbox_capacity,
        }
    }
}
