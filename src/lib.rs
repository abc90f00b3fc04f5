//! # GCodeLink
//!
//! A host-side protocol engine between G-code senders and motion
//! controllers:
//! - Grbl, Marlin, Smoothieware and TinyG response parsing
//! - Byte-counted and ok-counted flow control with a realtime bypass
//! - One session task per serial port, observed through an event bus
//!
//! ## Architecture
//!
//! GCodeLink is organized as a workspace with multiple crates:
//!
//! 1. **gcodelink-core** - Errors, workflow and queue types, event bus
//! 2. **gcodelink-communication** - Transports, firmware parsers, streaming, port sessions
//! 3. **gcodelink-settings** - TOML configuration
//! 4. **gcodelink** - Logging setup and the command line tool

pub use gcodelink_communication::{
    firmware, list_ports, FirmwareKind, FlowControl, ParsedEvent, PortEvent, PortHandle,
    PortRegistry, SessionConfig,
};
pub use gcodelink_core::{
    CommandSource, ConnectionError, ControllerError, Error, PortSnapshot, Result,
    WorkflowCommand, WorkflowState,
};
pub use gcodelink_settings::{Config, ConfigError, LoggingSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to
/// stderr so command output on stdout stays clean.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", settings.level, e))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if settings.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}
