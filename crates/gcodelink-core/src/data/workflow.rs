//! Workflow states and commands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host-side streaming state of one port session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// Nothing is being streamed from the queued lane
    #[default]
    Idle,
    /// The queued lane is being drained into the sender
    Running,
    /// Dispatch is suspended; acknowledgments still drain
    Paused,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

/// Operator request against the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowCommand {
    /// Begin draining the queued lane
    Start,
    /// Suspend dispatch
    Pause,
    /// Continue after a pause
    Resume,
    /// Abandon pending commands and return to idle
    Stop,
}

impl fmt::Display for WorkflowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Pause => write!(f, "pause"),
            Self::Resume => write!(f, "resume"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

impl FromStr for WorkflowCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "run" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "stop" => Ok(Self::Stop),
            other => Err(format!("unknown workflow command '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WorkflowState::Running).unwrap(),
            "\"running\""
        );
        let command: WorkflowCommand = serde_json::from_str("\"resume\"").unwrap();
        assert_eq!(command, WorkflowCommand::Resume);
    }

    #[test]
    fn test_workflow_command_from_str() {
        assert_eq!("Run".parse::<WorkflowCommand>(), Ok(WorkflowCommand::Start));
        assert_eq!(" stop ".parse::<WorkflowCommand>(), Ok(WorkflowCommand::Stop));
        assert!("halt".parse::<WorkflowCommand>().is_err());
    }
}
