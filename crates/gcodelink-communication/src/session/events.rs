//! Events a port session publishes to its subscribers

use crate::firmware::ParsedEvent;
use gcodelink_core::{
    BusEvent, DisconnectReason, EventCategory, InFlightCommand, WorkflowState,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything observers of a port can see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PortEvent {
    /// A line from the firmware, classified
    Parsed(ParsedEvent),
    /// The workflow changed state
    WorkflowChanged {
        /// State before the change
        from: WorkflowState,
        /// State after the change
        to: WorkflowState,
    },
    /// Queue progress
    QueueCounters {
        /// Commands accepted since the last program load
        total: u64,
        /// Commands acknowledged since the last program load
        executed: u64,
        /// Commands awaiting acknowledgment
        outstanding: usize,
        /// Commands not yet sent
        pending: usize,
    },
    /// A line was written to the firmware
    CommandSent(InFlightCommand),
    /// The firmware accepted a line
    CommandAcknowledged(InFlightCommand),
    /// The firmware rejected a line
    CommandFailed {
        /// The rejected command
        command: InFlightCommand,
        /// Firmware message
        message: String,
    },
    /// The firmware identified itself and accepts commands
    Ready,
    /// The oldest in-flight command has waited longer than the stall timeout
    QueueStalled {
        /// The waiting command
        command: InFlightCommand,
        /// How long it has waited
        waited_ms: u64,
    },
    /// The session ended
    Disconnected {
        /// Why it ended
        reason: DisconnectReason,
    },
}

impl BusEvent for PortEvent {
    fn category(&self) -> EventCategory {
        match self {
            PortEvent::Parsed(_) => EventCategory::Protocol,
            PortEvent::WorkflowChanged { .. } => EventCategory::Workflow,
            PortEvent::QueueCounters { .. }
            | PortEvent::CommandSent(_)
            | PortEvent::CommandAcknowledged(_)
            | PortEvent::QueueStalled { .. } => EventCategory::Queue,
            PortEvent::CommandFailed { .. } => EventCategory::Error,
            PortEvent::Ready | PortEvent::Disconnected { .. } => EventCategory::Connection,
        }
    }
}

impl fmt::Display for PortEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortEvent::Parsed(event) => write!(f, "{}", event.kind()),
            PortEvent::WorkflowChanged { from, to } => write!(f, "workflow {} -> {}", from, to),
            PortEvent::QueueCounters {
                total,
                executed,
                outstanding,
                pending,
            } => write!(
                f,
                "queue {}/{} ({} outstanding, {} pending)",
                executed, total, outstanding, pending
            ),
            PortEvent::CommandSent(command) => write!(f, "sent '{}'", command.text),
            PortEvent::CommandAcknowledged(command) => write!(f, "ok '{}'", command.text),
            PortEvent::CommandFailed { command, message } => {
                write!(f, "failed '{}': {}", command.text, message)
            }
            PortEvent::Ready => write!(f, "ready"),
            PortEvent::QueueStalled { command, waited_ms } => {
                write!(f, "stalled on '{}' for {} ms", command.text, waited_ms)
            }
            PortEvent::Disconnected { reason } => write!(f, "disconnected: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodelink_core::EventFilter;

    #[test]
    fn test_categories() {
        let filter = EventFilter::Categories(vec![EventCategory::Workflow]);
        assert!(filter.matches(&PortEvent::WorkflowChanged {
            from: WorkflowState::Idle,
            to: WorkflowState::Running,
        }));
        assert!(!filter.matches(&PortEvent::Ready));
        assert_eq!(
            PortEvent::Parsed(ParsedEvent::Ok).category(),
            EventCategory::Protocol
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(PortEvent::Disconnected {
            reason: DisconnectReason::ConnectionLost,
        })
        .unwrap();
        assert_eq!(json["event"], "disconnected");
        assert_eq!(json["data"]["reason"]["reason"], "connection_lost");
    }
}
