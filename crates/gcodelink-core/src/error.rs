//! Error handling for GCodeLink
//!
//! Provides error types for each layer of the protocol engine:
//! - Controller errors (workflow gating, flow control, firmware rejections)
//! - Connection errors (port lifecycle and transport failures)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Controller error type
///
/// Represents errors raised by the protocol engine while deciding whether a
/// request may be carried out against the connected firmware.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The port has not yet produced a startup banner
    #[error("Port {port} is not ready")]
    NotReady {
        /// The port that is not ready.
        port: String,
    },

    /// Invalid workflow state transition
    #[error("Invalid state transition from {current} to {requested}")]
    InvalidStateTransition {
        /// The current state name.
        current: String,
        /// The requested transition.
        requested: String,
    },

    /// Request was rejected before reaching the firmware
    #[error("Command rejected: {reason}")]
    CommandRejected {
        /// The reason the command was rejected.
        reason: String,
    },

    /// The sender was asked to exceed the firmware's receive buffer
    #[error("Receive buffer capacity exceeded: {requested} bytes requested, {available} available")]
    CapacityViolation {
        /// Bytes the command would occupy.
        requested: usize,
        /// Bytes of credit left in the receive buffer.
        available: usize,
    },

    /// A single line can never fit in the firmware's receive buffer
    #[error("Command of {length} bytes exceeds receive buffer capacity of {capacity} bytes")]
    CommandTooLong {
        /// Line length including terminator.
        length: usize,
        /// Receive buffer capacity.
        capacity: usize,
    },

    /// An alarm is latched and must be cleared by an unlock
    #[error("Alarm latched: {message}")]
    AlarmLatched {
        /// The alarm message reported by the firmware.
        message: String,
    },

    /// The firmware family does not support the request
    #[error("{feature} not supported by {firmware}")]
    Unsupported {
        /// The firmware family.
        firmware: String,
        /// The unsupported feature.
        feature: String,
    },
}

/// Connection error type
///
/// Represents errors related to opening, driving and closing a port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Port is already in use
    #[error("Port already in use: {port}")]
    PortInUse {
        /// The name of the port that is in use.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Connection lost
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// The port session task is no longer running
    #[error("Session for port {port} is closed")]
    SessionClosed {
        /// The port whose session has ended.
        port: String,
    },

    /// Serial port error
    #[error("Serial port error: {reason}")]
    SerialError {
        /// The reason for the serial port error.
        reason: String,
    },
}

/// Main error type for GCodeLink
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    ///
    /// Connection and I/O errors are fatal to a port session.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }

    /// Check if this is a controller error
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Controller(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_display() {
        let err = ControllerError::CapacityViolation {
            requested: 61,
            available: 57,
        };
        assert_eq!(
            err.to_string(),
            "Receive buffer capacity exceeded: 61 bytes requested, 57 available"
        );

        let err = ControllerError::InvalidStateTransition {
            current: "Idle".to_string(),
            requested: "pause".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid state transition from Idle to pause");
    }

    #[test]
    fn test_error_classification() {
        let err: Error = ConnectionError::ConnectionLost {
            reason: "unplugged".to_string(),
        }
        .into();
        assert!(err.is_connection_error());
        assert!(!err.is_controller_error());

        let err: Error = ControllerError::NotReady {
            port: "/dev/ttyUSB0".to_string(),
        }
        .into();
        assert!(err.is_controller_error());
        assert_eq!(err.to_string(), "Port /dev/ttyUSB0 is not ready");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: Error = io.into();
        assert!(err.is_connection_error());
    }
}
