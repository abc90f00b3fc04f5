//! In-memory transport
//!
//! Simulates controllers without hardware. A [`MemoryDevice`] is the
//! firmware side: it records everything the session writes and lets the
//! caller inject response lines, disconnects and failures.

use super::{Connector, Transport, TransportEvent, TransportPair};
use gcodelink_core::{ConnectionError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

type Responder = Arc<dyn Fn(&[u8]) -> Vec<String> + Send + Sync>;

#[derive(Default)]
struct DeviceState {
    writes: Vec<Vec<u8>>,
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    responder: Option<Responder>,
    open: bool,
    fail_writes: bool,
}

/// Firmware side of an in-memory port
#[derive(Clone, Default)]
pub struct MemoryDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MemoryDevice {
    /// Create a device that is not yet opened
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every write with the lines `responder` returns
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&[u8]) -> Vec<String> + Send + Sync + 'static,
    {
        self.state.lock().responder = Some(Arc::new(responder));
    }

    /// Answer every written line with `ok`, ignoring realtime bytes
    pub fn auto_ok(&self) {
        self.set_responder(|data| {
            if data.ends_with(b"\n") {
                vec!["ok".to_string()]
            } else {
                Vec::new()
            }
        });
    }

    /// Deliver a line to the session; returns false when not open
    pub fn push_line(&self, line: &str) -> bool {
        self.send(TransportEvent::Line(line.to_string()))
    }

    /// Simulate the device going away
    pub fn disconnect(&self) -> bool {
        self.send(TransportEvent::Closed)
    }

    /// Simulate a transport error
    pub fn fail(&self, reason: &str) -> bool {
        self.send(TransportEvent::Error(reason.to_string()))
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Every write call, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// Lines written, without terminators
    pub fn sent_lines(&self) -> Vec<String> {
        self.writes()
            .iter()
            .filter_map(|w| w.strip_suffix(b"\n"))
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Single control bytes written outside line framing
    pub fn realtime_bytes(&self) -> Vec<u8> {
        self.writes()
            .iter()
            .filter(|w| w.len() == 1 && w[0] != b'\n')
            .map(|w| w[0])
            .collect()
    }

    /// Forget recorded writes
    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// Whether a session currently holds the port open
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn send(&self, event: TransportEvent) -> bool {
        let state = self.state.lock();
        match &state.events {
            Some(tx) if state.open => tx.send(event).is_ok(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for MemoryDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryDevice")
            .field("open", &state.open)
            .field("writes", &state.writes.len())
            .finish()
    }
}

/// Connector over a set of named in-memory devices
#[derive(Clone, Default)]
pub struct MemoryConnector {
    devices: Arc<Mutex<HashMap<String, MemoryDevice>>>,
}

impl MemoryConnector {
    /// Create a connector with no devices
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the device behind `name`
    pub fn device(&self, name: &str) -> MemoryDevice {
        self.devices
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

impl Connector for MemoryConnector {
    fn open(&self, name: &str, _baud_rate: u32) -> Result<TransportPair> {
        let device = self
            .devices
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectionError::PortNotFound {
                port: name.to_string(),
            })?;

        let (tx, events) = mpsc::unbounded_channel();
        {
            let mut state = device.state.lock();
            if state.open {
                return Err(ConnectionError::PortInUse {
                    port: name.to_string(),
                }
                .into());
            }
            state.open = true;
            state.events = Some(tx);
        }

        Ok(TransportPair {
            transport: Box::new(MemoryTransport {
                name: name.to_string(),
                device,
            }),
            events,
        })
    }
}

/// Session side of an in-memory port
struct MemoryTransport {
    name: String,
    device: MemoryDevice,
}

impl Transport for MemoryTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let (responder, events) = {
            let mut state = self.device.state.lock();
            if !state.open {
                return Err(ConnectionError::SessionClosed {
                    port: self.name.clone(),
                }
                .into());
            }
            if state.fail_writes {
                return Err(ConnectionError::ConnectionLost {
                    reason: "write failed".to_string(),
                }
                .into());
            }
            state.writes.push(data.to_vec());
            (state.responder.clone(), state.events.clone())
        };

        if let (Some(responder), Some(tx)) = (responder, events) {
            for line in responder(data) {
                let _ = tx.send(TransportEvent::Line(line));
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.device.state.lock();
        state.open = false;
        state.events = None;
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
