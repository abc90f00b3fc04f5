//! Workflow state machine
//!
//! Gates when the feeder's queued lane may be drained into the sender.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running/Paused --stop--> Idle
//! Running --complete--> Idle
//! any --alarm--> Idle (latched until unlock)
//! ```

use gcodelink_core::{ControllerError, WorkflowCommand, WorkflowState};
use serde::{Deserialize, Serialize};

/// A state change that took place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// State before the change
    pub from: WorkflowState,
    /// State after the change
    pub to: WorkflowState,
}

/// What `start` needs to know about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartConditions {
    /// Lines waiting in the queued lane
    pub queued: usize,
    /// Startup banner received
    pub ready: bool,
}

/// Workflow for one port session
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    state: WorkflowState,
    alarm: Option<String>,
}

impl Workflow {
    /// Create an idle workflow
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Whether the queued lane may be drained
    pub fn is_running(&self) -> bool {
        self.state == WorkflowState::Running
    }

    /// Message of the latched alarm
    pub fn latched_alarm(&self) -> Option<&str> {
        self.alarm.as_deref()
    }

    /// Apply an operator command
    pub fn apply(
        &mut self,
        command: WorkflowCommand,
        conditions: StartConditions,
    ) -> Result<Transition, ControllerError> {
        match command {
            WorkflowCommand::Start => self.start(conditions),
            WorkflowCommand::Pause => self.pause(),
            WorkflowCommand::Resume => self.resume(),
            WorkflowCommand::Stop => self.stop(),
        }
    }

    /// Idle to Running
    pub fn start(&mut self, conditions: StartConditions) -> Result<Transition, ControllerError> {
        if self.state != WorkflowState::Idle {
            return Err(self.invalid(WorkflowCommand::Start));
        }
        if let Some(message) = &self.alarm {
            return Err(ControllerError::AlarmLatched {
                message: message.clone(),
            });
        }
        if !conditions.ready {
            return Err(ControllerError::CommandRejected {
                reason: "firmware has not reported ready".to_string(),
            });
        }
        if conditions.queued == 0 {
            return Err(ControllerError::CommandRejected {
                reason: "nothing queued".to_string(),
            });
        }
        Ok(self.enter(WorkflowState::Running))
    }

    /// Running to Paused
    pub fn pause(&mut self) -> Result<Transition, ControllerError> {
        match self.state {
            WorkflowState::Running => Ok(self.enter(WorkflowState::Paused)),
            _ => Err(self.invalid(WorkflowCommand::Pause)),
        }
    }

    /// Paused to Running
    pub fn resume(&mut self) -> Result<Transition, ControllerError> {
        match self.state {
            WorkflowState::Paused => Ok(self.enter(WorkflowState::Running)),
            _ => Err(self.invalid(WorkflowCommand::Resume)),
        }
    }

    /// Running or Paused to Idle; the caller clears the feeder
    pub fn stop(&mut self) -> Result<Transition, ControllerError> {
        match self.state {
            WorkflowState::Running | WorkflowState::Paused => Ok(self.enter(WorkflowState::Idle)),
            WorkflowState::Idle => Err(self.invalid(WorkflowCommand::Stop)),
        }
    }

    /// Firmware hold while running
    pub fn hold(&mut self) -> Option<Transition> {
        self.pause().ok()
    }

    /// Latch an alarm and force Idle
    pub fn alarm(&mut self, message: impl Into<String>) -> Option<Transition> {
        self.alarm = Some(message.into());
        self.force_idle()
    }

    /// Running to Idle once everything has been acknowledged
    pub fn complete(&mut self) -> Option<Transition> {
        match self.state {
            WorkflowState::Running => Some(self.enter(WorkflowState::Idle)),
            _ => None,
        }
    }

    /// Return to Idle without touching the alarm latch
    pub fn force_idle(&mut self) -> Option<Transition> {
        match self.state {
            WorkflowState::Idle => None,
            _ => Some(self.enter(WorkflowState::Idle)),
        }
    }

    /// Clear the alarm latch; returns whether one was set
    pub fn unlock(&mut self) -> bool {
        self.alarm.take().is_some()
    }

    fn enter(&mut self, to: WorkflowState) -> Transition {
        let from = self.state;
        self.state = to;
        tracing::debug!("Workflow {} -> {}", from, to);
        Transition { from, to }
    }

    fn invalid(&self, requested: WorkflowCommand) -> ControllerError {
        ControllerError::InvalidStateTransition {
            current: self.state.to_string(),
            requested: requested.to_string(),
        }
    }
}
