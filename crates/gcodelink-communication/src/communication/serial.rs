//! Serial port transport
//!
//! Opens USB/RS-232 controllers with the `serialport` crate. Reads happen on
//! a dedicated thread that frames lines and forwards them to the session.

use super::{Connector, LineFramer, Transport, TransportEvent, TransportPair};
use gcodelink_core::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Read timeout; bounds how long the reader takes to notice a close
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Port name prefixes that identify likely controller ports
const CONTROLLER_PORT_PREFIXES: [&str; 4] = [
    "/dev/ttyUSB",
    "/dev/ttyACM",
    "/dev/cu.usbserial",
    "/dev/cu.usbmodem",
];

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,
    /// Port description (e.g., "USB FTDI FT232R")
    pub description: String,
    /// Manufacturer name if available
    pub manufacturer: Option<String>,
    /// USB vendor and product IDs if applicable
    pub usb_ids: Option<(u16, u16)>,
}

/// List serial ports that look like motion controllers
///
/// Windows `COMn`, Linux `ttyUSB`/`ttyACM`, macOS `cu.usbserial`/`cu.usbmodem`.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::SerialError {
            reason: e.to_string(),
        }
    })?;

    Ok(ports
        .into_iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(|port| {
            let (description, manufacturer, usb_ids) = match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => (
                    format!(
                        "USB {} {}",
                        usb.manufacturer.as_deref().unwrap_or("Device"),
                        usb.product.as_deref().unwrap_or("Serial Port")
                    ),
                    usb.manufacturer.clone(),
                    Some((usb.vid, usb.pid)),
                ),
                serialport::SerialPortType::BluetoothPort => {
                    ("Bluetooth Serial".to_string(), None, None)
                }
                _ => ("Serial Port".to_string(), None, None),
            };
            SerialPortInfo {
                port_name: port.port_name,
                description,
                manufacturer,
                usb_ids,
            }
        })
        .collect())
}

fn is_controller_port(name: &str) -> bool {
    if let Some(number) = name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }
    CONTROLLER_PORT_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Opens serial ports as transports
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl SerialConnector {
    /// Create a connector
    pub fn new() -> Self {
        Self
    }
}

impl Connector for SerialConnector {
    fn open(&self, name: &str, baud_rate: u32) -> Result<TransportPair> {
        let failed = |e: &dyn std::fmt::Display| ConnectionError::FailedToOpen {
            port: name.to_string(),
            reason: e.to_string(),
        };

        let port = serialport::new(name, baud_rate)
            .timeout(READ_TIMEOUT)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", name, e);
                failed(&e)
            })?;
        let reader = port.try_clone().map_err(|e| failed(&e))?;

        let (tx, events) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_name = format!("serial-reader-{}", name);
        thread::Builder::new()
            .name(thread_name)
            .spawn(move || read_loop(reader, tx, thread_stop))
            .map_err(|e| failed(&e))?;

        tracing::info!("Opened serial port {} at {} baud", name, baud_rate);
        Ok(TransportPair {
            transport: Box::new(SerialTransport {
                name: name.to_string(),
                port: Some(port),
                stop,
            }),
            events,
        })
    }
}

fn read_loop(
    mut port: Box<dyn serialport::SerialPort>,
    tx: mpsc::UnboundedSender<TransportEvent>,
    stop: Arc<AtomicBool>,
) {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; 256];

    while !stop.load(Ordering::Relaxed) {
        match port.read(&mut buf) {
            Ok(0) => {
                let _ = tx.send(TransportEvent::Closed);
                return;
            }
            Ok(n) => {
                for line in framer.push(&buf[..n]) {
                    if tx.send(TransportEvent::Line(line)).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                if !stop.load(Ordering::Relaxed) {
                    tracing::error!("Serial read failed: {}", e);
                    let _ = tx.send(TransportEvent::Error(e.to_string()));
                }
                return;
            }
        }
    }
}

/// Write half of an open serial port
struct SerialTransport {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
    stop: Arc<AtomicBool>,
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or_else(|| ConnectionError::SessionClosed {
            port: self.name.clone(),
        })?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        if self.port.take().is_some() {
            tracing::info!("Closed serial port {}", self.name);
        }
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
