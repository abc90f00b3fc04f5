//! Event categories and the trait every bus event implements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An event that can travel over an [`EventBus`](super::EventBus)
pub trait BusEvent: Clone + Send + Sync + 'static {
    /// Category used by [`EventFilter`](super::EventFilter)
    fn category(&self) -> EventCategory;
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Parsed firmware output.
    Protocol,
    /// Workflow state changes.
    Workflow,
    /// Queue progress and command lifecycle.
    Queue,
    /// Port readiness and disconnects.
    Connection,
    /// Failures surfaced to observers.
    Error,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Protocol => write!(f, "Protocol"),
            EventCategory::Workflow => write!(f, "Workflow"),
            EventCategory::Queue => write!(f, "Queue"),
            EventCategory::Connection => write!(f, "Connection"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// Reason a port session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum DisconnectReason {
    /// Closed through the registry
    UserRequested,
    /// The transport reported end of stream
    ConnectionLost,
    /// The transport reported an error
    Error(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::UserRequested => write!(f, "closed by request"),
            DisconnectReason::ConnectionLost => write!(f, "connection lost"),
            DisconnectReason::Error(e) => write!(f, "error: {}", e),
        }
    }
}
