//! Port snapshots and queue counters

use super::workflow::WorkflowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress counters for the commands accepted on a port
///
/// `executed` never exceeds `total`. Both are cleared only when a new
/// program is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueCounters {
    /// Commands accepted for transmission since the last program load
    pub total: u64,
    /// Commands acknowledged (ok or error) by the firmware
    pub executed: u64,
}

impl QueueCounters {
    /// Record commands accepted into the queue
    pub fn record_enqueued(&mut self, count: u64) {
        self.total = self.total.saturating_add(count);
    }

    /// Record one acknowledged command
    ///
    /// Acknowledgments for commands accepted before the last reset are not
    /// counted once `executed` has caught up with `total`.
    pub fn record_executed(&mut self) {
        if self.executed < self.total {
            self.executed += 1;
        }
    }

    /// Clear both counters for a new program
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Program currently loaded into a port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProgram {
    /// Name supplied by the caller, typically the file name
    pub name: String,
    /// Number of lines queued after comment stripping
    pub total_lines: usize,
    /// When the program was loaded
    pub loaded_at: DateTime<Utc>,
}

/// Read-only view of a port, as returned by `list_ports`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSnapshot {
    /// Port name (e.g. "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Configured baud rate
    pub baud_rate: u32,
    /// Firmware family name
    pub firmware: String,
    /// Number of subscribed observers
    pub connected: usize,
    /// Startup banner received
    pub ready: bool,
    /// A connect or disconnect is in flight
    pub pending: bool,
    /// Commands accepted since the last program load
    pub queue_total: u64,
    /// Commands acknowledged since the last program load
    pub queue_executed: u64,
    /// Commands written and not yet acknowledged
    pub outstanding: usize,
    /// Commands waiting in the queued lane
    pub queued: usize,
    /// Current workflow state
    pub workflow: WorkflowState,
    /// Loaded program, if any
    pub active_program: Option<ActiveProgram>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executed_never_exceeds_total() {
        let mut counters = QueueCounters::default();
        counters.record_enqueued(2);
        counters.record_executed();
        counters.record_executed();
        counters.record_executed();
        assert_eq!(counters.total, 2);
        assert_eq!(counters.executed, 2);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut counters = QueueCounters::default();
        counters.record_enqueued(5);
        counters.record_executed();
        counters.reset();
        assert_eq!(counters, QueueCounters::default());

        // Late acknowledgment from before the reset is ignored
        counters.record_executed();
        assert_eq!(counters.executed, 0);
    }
}
