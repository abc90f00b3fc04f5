//! Realtime control bytes
//!
//! Single bytes the firmware acts on the moment they arrive, ahead of any
//! buffered lines. They are written outside flow control.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Step applied to a percentage override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStep {
    /// Back to 100%
    Reset,
    /// +10%
    CoarseIncrease,
    /// -10%
    CoarseDecrease,
    /// +1%
    FineIncrease,
    /// -1%
    FineDecrease,
}

impl OverrideStep {
    fn offset(self) -> u8 {
        match self {
            Self::Reset => 0,
            Self::CoarseIncrease => 1,
            Self::CoarseDecrease => 2,
            Self::FineIncrease => 3,
            Self::FineDecrease => 4,
        }
    }

    fn from_offset(offset: u8) -> Option<Self> {
        match offset {
            0 => Some(Self::Reset),
            1 => Some(Self::CoarseIncrease),
            2 => Some(Self::CoarseDecrease),
            3 => Some(Self::FineIncrease),
            4 => Some(Self::FineDecrease),
            _ => None,
        }
    }
}

/// Rapid override levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RapidOverrideLevel {
    /// Full rapid (100%)
    Full,
    /// Medium rapid (50%)
    Medium,
    /// Slow rapid (25%)
    Slow,
}

impl RapidOverrideLevel {
    /// Percentage of the configured rapid rate
    pub fn percent(self) -> u8 {
        match self {
            Self::Full => 100,
            Self::Medium => 50,
            Self::Slow => 25,
        }
    }
}

/// Out-of-band command understood by Grbl-style firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", content = "step", rename_all = "snake_case")]
pub enum RealtimeCommand {
    /// `?` request a status report
    StatusQuery,
    /// `!` feed hold
    FeedHold,
    /// `~` cycle start / resume
    CycleStart,
    /// Ctrl-X soft reset
    SoftReset,
    /// Safety door
    SafetyDoor,
    /// Cancel an active jog
    JogCancel,
    /// Feed rate override
    FeedOverride(OverrideStep),
    /// Rapid override
    RapidOverride(RapidOverrideLevel),
    /// Spindle speed override
    SpindleOverride(OverrideStep),
}

const FEED_OVERRIDE_BASE: u8 = 0x90;
const RAPID_OVERRIDE_BASE: u8 = 0x95;
const SPINDLE_OVERRIDE_BASE: u8 = 0x99;

impl RealtimeCommand {
    /// Byte on the wire
    pub fn byte(self) -> u8 {
        match self {
            Self::StatusQuery => b'?',
            Self::FeedHold => b'!',
            Self::CycleStart => b'~',
            Self::SoftReset => 0x18,
            Self::SafetyDoor => 0x84,
            Self::JogCancel => 0x85,
            Self::FeedOverride(step) => FEED_OVERRIDE_BASE + step.offset(),
            Self::RapidOverride(RapidOverrideLevel::Full) => RAPID_OVERRIDE_BASE,
            Self::RapidOverride(RapidOverrideLevel::Medium) => RAPID_OVERRIDE_BASE + 1,
            Self::RapidOverride(RapidOverrideLevel::Slow) => RAPID_OVERRIDE_BASE + 2,
            Self::SpindleOverride(step) => SPINDLE_OVERRIDE_BASE + step.offset(),
        }
    }

    /// Decode a control byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'?' => Some(Self::StatusQuery),
            b'!' => Some(Self::FeedHold),
            b'~' => Some(Self::CycleStart),
            0x18 => Some(Self::SoftReset),
            0x84 => Some(Self::SafetyDoor),
            0x85 => Some(Self::JogCancel),
            0x90..=0x94 => OverrideStep::from_offset(byte - FEED_OVERRIDE_BASE).map(Self::FeedOverride),
            0x95 => Some(Self::RapidOverride(RapidOverrideLevel::Full)),
            0x96 => Some(Self::RapidOverride(RapidOverrideLevel::Medium)),
            0x97 => Some(Self::RapidOverride(RapidOverrideLevel::Slow)),
            0x99..=0x9D => {
                OverrideStep::from_offset(byte - SPINDLE_OVERRIDE_BASE).map(Self::SpindleOverride)
            }
            _ => None,
        }
    }
}

impl fmt::Display for RealtimeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusQuery => write!(f, "status query"),
            Self::FeedHold => write!(f, "feed hold"),
            Self::CycleStart => write!(f, "cycle start"),
            Self::SoftReset => write!(f, "soft reset"),
            Self::SafetyDoor => write!(f, "safety door"),
            Self::JogCancel => write!(f, "jog cancel"),
            Self::FeedOverride(step) => write!(f, "feed override {:?}", step),
            Self::RapidOverride(level) => write!(f, "rapid override {}%", level.percent()),
            Self::SpindleOverride(step) => write!(f, "spindle override {:?}", step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_bytes() {
        assert_eq!(RealtimeCommand::StatusQuery.byte(), b'?');
        assert_eq!(RealtimeCommand::SoftReset.byte(), 0x18);
        assert_eq!(RealtimeCommand::JogCancel.byte(), 0x85);
        assert_eq!(
            RealtimeCommand::FeedOverride(OverrideStep::Reset).byte(),
            0x90
        );
        assert_eq!(
            RealtimeCommand::RapidOverride(RapidOverrideLevel::Slow).byte(),
            0x97
        );
        assert_eq!(
            RealtimeCommand::SpindleOverride(OverrideStep::FineDecrease).byte(),
            0x9D
        );
    }

    #[test]
    fn test_from_byte_covers_override_range() {
        for byte in 0x90..=0x9Du8 {
            match RealtimeCommand::from_byte(byte) {
                Some(command) => assert_eq!(command.byte(), byte),
                None => assert_eq!(byte, 0x98),
            }
        }
        assert_eq!(RealtimeCommand::from_byte(b'G'), None);
        assert_eq!(RealtimeCommand::from_byte(0x9E), None);
    }
}
