//! Sender with firmware flow control
//!
//! The sender is the only writer to the transport. It tracks every line it
//! writes until the firmware acknowledges it and refuses to write more than
//! the firmware can buffer.
//!
//! # Policies
//! - Ok-counted: one command in flight at a time
//! - Byte-counted: several commands in flight while the sum of their lengths
//!   (terminator included) fits the firmware's receive buffer
//!
//! Acknowledgments are matched strictly oldest-first; sends are never
//! reordered.

use crate::communication::Transport;
use chrono::Utc;
use gcodelink_core::{ControllerError, InFlightCommand, QueuedCommand, Result, LINE_TERMINATOR};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Receive buffer assumed for Grbl-style firmware until it advertises one
pub const DEFAULT_RX_BUFFER: usize = 127;

/// How many commands may be outstanding at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum FlowControl {
    /// At most one command awaiting acknowledgment
    OkCounted,
    /// Commands outstanding while their byte total fits `capacity`
    ByteCounted {
        /// Receive buffer size in bytes
        capacity: usize,
    },
}

impl FlowControl {
    /// Buffer capacity for the byte-counted policy
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::OkCounted => None,
            Self::ByteCounted { capacity } => Some(*capacity),
        }
    }
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OkCounted => write!(f, "ok-counted"),
            Self::ByteCounted { capacity } => write!(f, "byte-counted ({} bytes)", capacity),
        }
    }
}

/// In-flight window over a transport
pub struct Sender {
    transport: Box<dyn Transport>,
    flow_control: FlowControl,
    in_flight: VecDeque<InFlightCommand>,
    buffered_bytes: usize,
}

impl Sender {
    /// Create a sender writing to `transport`
    pub fn new(transport: Box<dyn Transport>, flow_control: FlowControl) -> Self {
        Self {
            transport,
            flow_control,
            in_flight: VecDeque::new(),
            buffered_bytes: 0,
        }
    }

    /// Active flow control policy
    pub fn flow_control(&self) -> FlowControl {
        self.flow_control
    }

    /// Whether a line of `byte_length` bytes can ever be sent
    pub fn fits(&self, byte_length: usize) -> bool {
        self.flow_control
            .capacity()
            .is_none_or(|capacity| byte_length <= capacity)
    }

    /// Whether a line of `byte_length` bytes may be sent now
    pub fn can_send(&self, byte_length: usize) -> bool {
        match self.flow_control {
            FlowControl::OkCounted => self.in_flight.is_empty(),
            FlowControl::ByteCounted { capacity } => self.buffered_bytes + byte_length <= capacity,
        }
    }

    /// Write a command and start tracking it
    ///
    /// Callers check [`Sender::can_send`] first; a command that does not fit
    /// is refused with `CapacityViolation` and nothing is written.
    pub fn transmit(&mut self, command: QueuedCommand) -> Result<&InFlightCommand> {
        let byte_length = command.byte_length();
        if !self.can_send(byte_length) {
            let available = self.available();
            tracing::error!(
                "Refusing to send {} bytes with {} bytes of credit ({})",
                byte_length,
                available,
                self.flow_control
            );
            return Err(ControllerError::CapacityViolation {
                requested: byte_length,
                available,
            }
            .into());
        }

        let mut line = Vec::with_capacity(byte_length);
        line.extend_from_slice(command.text.as_bytes());
        line.extend_from_slice(LINE_TERMINATOR.as_bytes());
        self.transport.write(&line)?;
        tracing::debug!("> {}", command.text);

        self.buffered_bytes += byte_length;
        self.in_flight
            .push_back(InFlightCommand::from_queued(command, Utc::now()));
        Ok(self
            .in_flight
            .back()
            .unwrap_or_else(|| unreachable!("command was just pushed")))
    }

    /// Write a control byte outside flow control
    pub fn write_realtime(&mut self, byte: u8) -> Result<()> {
        tracing::debug!("> realtime 0x{:02X}", byte);
        self.transport.write(&[byte])
    }

    /// Settle the oldest in-flight command after an `ok` or `error`
    pub fn acknowledge(&mut self) -> Option<InFlightCommand> {
        let command = self.in_flight.pop_front()?;
        self.buffered_bytes = self.buffered_bytes.saturating_sub(command.byte_length);
        Some(command)
    }

    /// Discard all in-flight bookkeeping
    pub fn flush(&mut self) -> Vec<InFlightCommand> {
        self.buffered_bytes = 0;
        self.in_flight.drain(..).collect()
    }

    /// Replace the byte-counted capacity with the firmware's advertised size
    ///
    /// Only applied while nothing is in flight so the window never shrinks
    /// below what is already outstanding.
    pub fn adopt_capacity(&mut self, advertised: usize) -> bool {
        match self.flow_control {
            FlowControl::ByteCounted { capacity }
                if advertised > 0 && advertised != capacity && self.in_flight.is_empty() =>
            {
                tracing::info!(
                    "Receive buffer capacity {} -> {} bytes",
                    capacity,
                    advertised
                );
                self.flow_control = FlowControl::ByteCounted {
                    capacity: advertised,
                };
                true
            }
            _ => false,
        }
    }

    /// Close the underlying transport
    pub fn close(&mut self) -> Result<()> {
        self.flush();
        self.transport.close()
    }

    /// Commands awaiting acknowledgment, oldest first
    pub fn in_flight(&self) -> impl Iterator<Item = &InFlightCommand> {
        self.in_flight.iter()
    }

    /// Number of commands awaiting acknowledgment
    pub fn outstanding(&self) -> usize {
        self.in_flight.len()
    }

    /// Bytes of in-flight commands
    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    /// Credit left under the byte-counted policy
    pub fn available(&self) -> usize {
        match self.flow_control {
            FlowControl::OkCounted => usize::from(self.in_flight.is_empty()),
            FlowControl::ByteCounted { capacity } => capacity.saturating_sub(self.buffered_bytes),
        }
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("flow_control", &self.flow_control)
            .field("outstanding", &self.in_flight.len())
            .field("buffered_bytes", &self.buffered_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::{Connector, MemoryConnector, MemoryDevice};
    use gcodelink_core::CommandSource;

    fn sender(flow_control: FlowControl) -> (Sender, MemoryDevice) {
        let connector = MemoryConnector::new();
        let device = connector.device("mem");
        let pair = connector.open("mem", 115200).unwrap();
        (Sender::new(pair.transport, flow_control), device)
    }

    fn command(id: u64, len: usize) -> QueuedCommand {
        QueuedCommand::new(id, "G".repeat(len - 1), CommandSource::Program)
    }

    #[test]
    fn test_byte_counted_holds_second_command() {
        let (mut sender, device) = sender(FlowControl::ByteCounted { capacity: 127 });

        assert!(sender.can_send(70));
        sender.transmit(command(1, 70)).unwrap();
        assert!(!sender.can_send(60));
        assert_eq!(sender.available(), 57);

        sender.acknowledge().unwrap();
        assert!(sender.can_send(60));
        sender.transmit(command(2, 60)).unwrap();

        assert_eq!(device.sent_lines().len(), 2);
        assert_eq!(sender.buffered_bytes(), 60);
    }

    #[test]
    fn test_transmit_refuses_capacity_violation() {
        let (mut sender, device) = sender(FlowControl::ByteCounted { capacity: 127 });
        sender.transmit(command(1, 70)).unwrap();

        let err = sender.transmit(command(2, 60)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Receive buffer capacity exceeded: 60 bytes requested, 57 available"
        );
        assert_eq!(device.sent_lines().len(), 1);
        assert_eq!(sender.outstanding(), 1);
    }

    #[test]
    fn test_ok_counted_fifo() {
        let (mut sender, _device) = sender(FlowControl::OkCounted);

        sender
            .transmit(QueuedCommand::new(1, "A", CommandSource::Program))
            .unwrap();
        assert!(!sender.can_send(2));
        assert!(sender
            .transmit(QueuedCommand::new(2, "B", CommandSource::Program))
            .is_err());

        assert_eq!(sender.acknowledge().unwrap().text, "A");
        sender
            .transmit(QueuedCommand::new(2, "B", CommandSource::Program))
            .unwrap();
        assert_eq!(sender.acknowledge().unwrap().text, "B");
        assert!(sender.acknowledge().is_none());
    }

    #[test]
    fn test_realtime_ignores_window() {
        let (mut sender, device) = sender(FlowControl::ByteCounted { capacity: 10 });
        sender.transmit(command(1, 10)).unwrap();
        assert_eq!(sender.available(), 0);

        sender.write_realtime(b'?').unwrap();
        assert_eq!(device.realtime_bytes(), vec![b'?']);
    }

    #[test]
    fn test_adopt_capacity_only_when_idle() {
        let (mut sender, _device) = sender(FlowControl::ByteCounted { capacity: 127 });
        sender.transmit(command(1, 5)).unwrap();
        assert!(!sender.adopt_capacity(255));

        sender.acknowledge();
        assert!(sender.adopt_capacity(255));
        assert_eq!(sender.flow_control().capacity(), Some(255));

        let (mut ok_sender, _device) = sender_ok();
        assert!(!ok_sender.adopt_capacity(255));
    }

    fn sender_ok() -> (Sender, MemoryDevice) {
        sender(FlowControl::OkCounted)
    }

    #[test]
    fn test_flush_releases_window() {
        let (mut sender, _device) = sender(FlowControl::ByteCounted { capacity: 100 });
        sender.transmit(command(1, 25)).unwrap();
        sender.transmit(command(2, 25)).unwrap();
        assert_eq!(sender.available(), 50);

        let dropped = sender.flush();
        assert_eq!(dropped.len(), 2);
        assert_eq!(sender.buffered_bytes(), 0);
        assert_eq!(sender.outstanding(), 0);
        assert!(sender.fits(100));
        assert!(!sender.fits(101));
    }
}
