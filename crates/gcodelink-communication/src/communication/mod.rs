//! Transport layer
//!
//! A transport is the byte pipe to one controller. The session owns the
//! write half exclusively; the read half arrives as a stream of
//! newline-framed [`TransportEvent`]s.
//!
//! Implementations:
//! - [`serial::SerialConnector`]: USB/RS-232 through the `serialport` crate
//! - [`memory::MemoryConnector`]: in-process device used by tests and demos

pub mod memory;
pub mod serial;

use gcodelink_core::Result;
use tokio::sync::mpsc;

pub use memory::{MemoryConnector, MemoryDevice};
pub use serial::{list_ports, SerialConnector, SerialPortInfo};

/// Something arriving from the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One line without its terminator
    Line(String),
    /// The device closed the connection
    Closed,
    /// The transport failed
    Error(String),
}

/// Write half of an open connection
pub trait Transport: Send {
    /// Write all bytes
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Release the connection; further writes fail
    fn close(&mut self) -> Result<()>;
}

/// An opened connection
pub struct TransportPair {
    /// Write half, owned by the session
    pub transport: Box<dyn Transport>,
    /// Incoming lines in arrival order
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl std::fmt::Debug for TransportPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportPair").finish_non_exhaustive()
    }
}

/// Opens transports by port name
pub trait Connector: Send + Sync {
    /// Open `name` at `baud_rate`
    fn open(&self, name: &str, baud_rate: u32) -> Result<TransportPair>;
}

/// Longest line kept by [`LineFramer`]; anything longer is discarded
pub const MAX_LINE_LENGTH: usize = 1024;

/// Splits a byte stream into lines
///
/// `\r` is dropped, blank lines are skipped and invalid UTF-8 is replaced.
/// A line growing past [`MAX_LINE_LENGTH`] without a newline is dropped up
/// to the next newline.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
    overflowed: bool,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and collect every completed line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            match byte {
                b'\n' => {
                    if !self.overflowed && !self.pending.is_empty() {
                        lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    }
                    self.pending.clear();
                    self.overflowed = false;
                }
                b'\r' => {}
                _ if self.overflowed => {}
                other => {
                    if self.pending.len() >= MAX_LINE_LENGTH {
                        tracing::warn!(
                            "Discarding line longer than {} bytes without a newline",
                            MAX_LINE_LENGTH
                        );
                        self.pending.clear();
                        self.overflowed = true;
                    } else {
                        self.pending.push(other);
                    }
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_framer_split_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"o").is_empty());
        assert_eq!(framer.push(b"k\r\n<Idle|"), vec!["ok".to_string()]);
        assert_eq!(
            framer.push(b"MPos:0,0,0>\nok\n"),
            vec!["<Idle|MPos:0,0,0>".to_string(), "ok".to_string()]
        );
    }

    #[test]
    fn test_line_framer_skips_blank_lines() {
        let mut framer = LineFramer::new();
        assert_eq!(
            framer.push(b"\r\n\r\nok\r\n\n"),
            vec!["ok".to_string()]
        );
    }

    #[test]
    fn test_line_framer_drops_overlong_line() {
        let mut framer = LineFramer::new();
        let noise = vec![b'x'; MAX_LINE_LENGTH * 3];
        assert!(framer.push(&noise).is_empty());
        assert!(framer.pending.len() <= MAX_LINE_LENGTH);
        assert_eq!(framer.push(b"tail\nok\n"), vec!["ok".to_string()]);
    }
}
