//! # GCodeLink Communication
//!
//! Protocol engine between a host and a motion controller.
//! Parses Grbl, Marlin, Smoothieware and TinyG responses, streams commands
//! under each firmware's flow control, and runs one session task per open
//! port.

pub mod communication;
pub mod firmware;
pub mod session;
pub mod streaming;

pub use communication::{
    list_ports, Connector, LineFramer, MemoryConnector, MemoryDevice, SerialConnector,
    SerialPortInfo, Transport, TransportEvent, TransportPair,
};

pub use firmware::{
    parse, Acknowledgment, ControllerState, EventKind, FirmwareKind, FirmwareMessage, Handshake,
    LineParser, ParsedEvent, StartupBanner, StatusReport,
};

pub use session::{PortEvent, PortHandle, PortRegistry, PortSession, SessionConfig};

pub use streaming::{
    program_lines, strip_comments, Feeder, FlowControl, OverrideStep, RapidOverrideLevel,
    RealtimeCommand, Sender, StartConditions, Transition, Workflow, DEFAULT_RX_BUFFER,
};
