//! Data models shared by the protocol engine
//!
//! This module provides:
//! - Queued and in-flight command records
//! - Workflow states and the commands that move between them
//! - Port snapshots and queue counters exposed to observers

pub mod command;
pub mod port;
pub mod workflow;

pub use command::{CommandSource, InFlightCommand, QueuedCommand, LINE_TERMINATOR};
pub use port::{ActiveProgram, PortSnapshot, QueueCounters};
pub use workflow::{WorkflowCommand, WorkflowState};
