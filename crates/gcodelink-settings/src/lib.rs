//! GCodeLink Settings Crate
//!
//! Loads and validates the TOML configuration and turns it into session
//! defaults for the port registry.

pub mod config;
pub mod error;

pub use config::{Config, ConnectionSettings, FlowPolicy, LoggingSettings, StreamingSettings};
pub use error::{ConfigError, ConfigResult};
