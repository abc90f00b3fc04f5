//! # GCodeLink Core
//!
//! Core types shared by the GCodeLink protocol engine.
//! Provides the error hierarchy, the command and workflow data model,
//! and the event bus port sessions publish on.

pub mod data;
pub mod error;
pub mod event_bus;

pub use data::{
    ActiveProgram, CommandSource, InFlightCommand, PortSnapshot, QueueCounters, QueuedCommand,
    WorkflowCommand, WorkflowState, LINE_TERMINATOR,
};

pub use error::{ConnectionError, ControllerError, Error, Result};

pub use event_bus::{
    BusEvent, DisconnectReason, EventBus, EventBusConfig, EventCategory, EventFilter,
    SubscriptionId,
};
