//! Command records
//!
//! A command is accepted into the feeder as a [`QueuedCommand`], moves into the
//! sender's window as an [`InFlightCommand`] when transmitted, and is dropped
//! once the firmware acknowledges it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminator appended to every queued line on the wire
pub const LINE_TERMINATOR: &str = "\n";

/// Origin of a queued command
///
/// The declaration order is the feeder's source priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandSource {
    /// Lines of a loaded G-code program
    Program,
    /// Lines expanded from a macro
    Macro,
    /// Manual jog commands
    Jog,
    /// Commands issued by the engine or an operator console
    System,
}

impl CommandSource {
    /// All sources in feeder priority order
    pub const ALL: [CommandSource; 4] = [
        CommandSource::Program,
        CommandSource::Macro,
        CommandSource::Jog,
        CommandSource::System,
    ];

    /// Position of this source in [`CommandSource::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program => write!(f, "program"),
            Self::Macro => write!(f, "macro"),
            Self::Jog => write!(f, "jog"),
            Self::System => write!(f, "system"),
        }
    }
}

impl FromStr for CommandSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "program" | "gcode" => Ok(Self::Program),
            "macro" => Ok(Self::Macro),
            "jog" => Ok(Self::Jog),
            "system" | "console" => Ok(Self::System),
            other => Err(format!("unknown command source '{}'", other)),
        }
    }
}

/// A command accepted into the feeder's queued lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedCommand {
    /// Monotonic identifier assigned by the feeder
    pub sequence_id: u64,
    /// Line text without terminator
    pub text: String,
    /// Where the command came from
    pub source: CommandSource,
    /// When the command was accepted
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedCommand {
    /// Create a new queued command stamped with the current time
    pub fn new(sequence_id: u64, text: impl Into<String>, source: CommandSource) -> Self {
        Self {
            sequence_id,
            text: text.into(),
            source,
            enqueued_at: Utc::now(),
        }
    }

    /// Bytes the command occupies in the firmware's receive buffer
    pub fn byte_length(&self) -> usize {
        self.text.len() + LINE_TERMINATOR.len()
    }
}

/// A command written to the transport and awaiting acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightCommand {
    /// Identifier carried over from the queued command
    pub sequence_id: u64,
    /// Line text without terminator
    pub text: String,
    /// Where the command came from
    pub source: CommandSource,
    /// When the command was written
    pub sent_at: DateTime<Utc>,
    /// Bytes occupied in the receive buffer, terminator included
    pub byte_length: usize,
}

impl InFlightCommand {
    /// Promote a queued command at transmit time
    pub fn from_queued(command: QueuedCommand, sent_at: DateTime<Utc>) -> Self {
        let byte_length = command.byte_length();
        Self {
            sequence_id: command.sequence_id,
            text: command.text,
            source: command.source,
            sent_at,
            byte_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_length_counts_terminator() {
        let cmd = QueuedCommand::new(1, "G0 X10", CommandSource::Program);
        assert_eq!(cmd.byte_length(), 7);

        let sent = InFlightCommand::from_queued(cmd, Utc::now());
        assert_eq!(sent.byte_length, 7);
        assert_eq!(sent.sequence_id, 1);
    }

    #[test]
    fn test_source_priority_order() {
        let mut sources = vec![
            CommandSource::System,
            CommandSource::Jog,
            CommandSource::Program,
            CommandSource::Macro,
        ];
        sources.sort();
        assert_eq!(sources, CommandSource::ALL.to_vec());
        assert_eq!(CommandSource::Jog.index(), 2);
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("Macro".parse::<CommandSource>(), Ok(CommandSource::Macro));
        assert_eq!("gcode".parse::<CommandSource>(), Ok(CommandSource::Program));
        assert!("pendant".parse::<CommandSource>().is_err());
    }
}
