//! Firmware implementations for supported motion controllers
//!
//! Supported controllers:
//! - Grbl: character-counted streaming, `<...>` status reports
//! - Marlin: ok-counted streaming, `echo:` and `//action:` host messages
//! - Smoothieware: Grbl-compatible reports plus its own version banner
//! - TinyG: JSON reports with `r`/`sr` objects and footer status codes
//!
//! Each family contributes an ordered matcher table to the
//! [`registry`], which turns raw response lines into [`ParsedEvent`]s.

pub mod common;
pub mod controller_state;
pub mod grbl;
pub mod marlin;
pub mod registry;
pub mod response;
pub mod smoothieware;
pub mod tinyg;

pub use controller_state::ControllerState;
pub use registry::{parse, LineParser, Matcher};
pub use response::{
    Acknowledgment, BufferState, BuildOptions, EventKind, FirmwareMessage, Footer, Overrides,
    ParsedEvent, Position, StartupBanner, StatusReport, Temperature, VersionInfo,
};

use crate::streaming::realtime::RealtimeCommand;
use crate::streaming::sender::{FlowControl, DEFAULT_RX_BUFFER};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported firmware families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareKind {
    /// Grbl 0.9 / 1.1 (default, most common)
    #[default]
    Grbl,
    /// Marlin 3D printer firmware
    Marlin,
    /// Smoothieware
    Smoothie,
    /// TinyG / g2core JSON protocol
    TinyG,
}

impl FirmwareKind {
    /// All supported firmware families
    pub const ALL: [FirmwareKind; 4] = [
        FirmwareKind::Grbl,
        FirmwareKind::Marlin,
        FirmwareKind::Smoothie,
        FirmwareKind::TinyG,
    ];

    /// Flow control policy used unless configuration overrides it
    pub fn default_flow_control(self) -> FlowControl {
        match self {
            Self::Grbl | Self::Smoothie => FlowControl::ByteCounted {
                capacity: DEFAULT_RX_BUFFER,
            },
            Self::Marlin | Self::TinyG => FlowControl::OkCounted,
        }
    }

    /// Byte written periodically to request a status report
    ///
    /// TinyG pushes status reports on its own and Marlin has no realtime
    /// query, so only the Grbl-style firmware is polled.
    pub fn status_poll_byte(self) -> Option<u8> {
        match self {
            Self::Grbl | Self::Smoothie => Some(RealtimeCommand::StatusQuery.byte()),
            Self::Marlin | Self::TinyG => None,
        }
    }

    /// Whether the firmware treats `byte` as an out-of-band control byte
    pub fn accepts_realtime(self, byte: u8) -> bool {
        match self {
            Self::Grbl | Self::Smoothie => RealtimeCommand::from_byte(byte).is_some(),
            Self::TinyG => matches!(byte, b'?' | b'!' | b'~' | b'%' | 0x18),
            Self::Marlin => false,
        }
    }

    /// Line that clears a latched alarm
    pub fn unlock_command(self) -> &'static str {
        match self {
            Self::Grbl | Self::Smoothie => "$X",
            Self::Marlin => "M999",
            Self::TinyG => "$clear",
        }
    }

    /// Whether a rejected line is answered with `Error:` and then `ok`
    pub fn error_precedes_ok(self) -> bool {
        matches!(self, Self::Marlin)
    }

    /// Request sent right after the transport opens to provoke a banner
    pub fn handshake(self) -> Handshake {
        match self {
            Self::Grbl | Self::TinyG => Handshake::Realtime(RealtimeCommand::SoftReset.byte()),
            Self::Smoothie => Handshake::Line("version"),
            Self::Marlin => Handshake::Line("M115"),
        }
    }
}

/// Opening exchange that makes the firmware identify itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// Write a single control byte
    Realtime(u8),
    /// Send a line through the sender
    Line(&'static str),
}

impl fmt::Display for FirmwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grbl => write!(f, "Grbl"),
            Self::Marlin => write!(f, "Marlin"),
            Self::Smoothie => write!(f, "Smoothie"),
            Self::TinyG => write!(f, "TinyG"),
        }
    }
}

impl FromStr for FirmwareKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grbl" => Ok(Self::Grbl),
            "marlin" => Ok(Self::Marlin),
            "smoothie" | "smoothieware" => Ok(Self::Smoothie),
            "tinyg" | "g2core" => Ok(Self::TinyG),
            other => Err(format!("unknown firmware '{}'", other)),
        }
    }
}
