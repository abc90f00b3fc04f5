//! Controller state
//!
//! Last-known firmware information for one connected device, folded from
//! the stream of [`ParsedEvent`]s.

use super::response::{
    BuildOptions, FirmwareMessage, Overrides, ParsedEvent, StartupBanner, StatusReport,
    VersionInfo,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Decoded firmware state for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Most recent banner
    pub banner: Option<StartupBanner>,
    /// Version details
    pub version: Option<VersionInfo>,
    /// Grbl build options
    pub options: Option<BuildOptions>,
    /// Firmware settings by name (`$110`, `$N0`, ...)
    pub settings: BTreeMap<String, String>,
    /// Coordinate parameters by name (`G54`, `PRB`, ...)
    pub parameters: BTreeMap<String, String>,
    /// Active modal words
    pub parser_state: Vec<String>,
    /// Status merged from every report since connect
    pub status: StatusReport,
    /// TinyG manual overrides
    pub overrides: Option<Overrides>,
    /// TinyG power management
    pub power_management: Option<Value>,
    /// Last alarm received
    pub last_alarm: Option<FirmwareMessage>,
    /// Last error received
    pub last_error: Option<FirmwareMessage>,
}

impl ControllerState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state
    pub fn apply(&mut self, event: &ParsedEvent) {
        match event {
            ParsedEvent::Startup(banner) => {
                if banner.boot {
                    self.status = StatusReport::default();
                    self.parser_state.clear();
                }
                self.banner = Some(banner.clone());
            }
            ParsedEvent::Version(info) => self.version = Some(info.clone()),
            ParsedEvent::Option(options) => self.options = Some(options.clone()),
            ParsedEvent::Settings { name, value } => {
                self.settings.insert(name.clone(), value.clone());
            }
            ParsedEvent::Parameters { name, value } => {
                self.parameters.insert(name.clone(), value.clone());
            }
            ParsedEvent::ParserState { modal } => self.parser_state = modal.clone(),
            ParsedEvent::StatusReport(report) => self.status.merge(report),
            ParsedEvent::ReceiveReport(report) => {
                if let Some(status) = &report.status {
                    self.status.merge(status);
                }
            }
            ParsedEvent::Overrides { overrides, .. } => self.overrides = Some(*overrides),
            ParsedEvent::PowerManagement { report, .. } => {
                self.power_management = Some(report.clone())
            }
            ParsedEvent::Alarm(alarm) => self.last_alarm = Some(alarm.clone()),
            ParsedEvent::Error(error) => self.last_error = Some(error.clone()),
            ParsedEvent::Echo { .. }
            | ParsedEvent::Feedback { .. }
            | ParsedEvent::Ok
            | ParsedEvent::Action { .. }
            | ParsedEvent::Unrecognized { .. } => {}
        }
    }

    /// Whether the last status report shows a firmware feed hold or door
    pub fn machine_hold(&self) -> bool {
        self.status.is_hold()
    }

    /// Receive buffer size advertised by `[OPT:...]`
    pub fn advertised_rx_buffer(&self) -> Option<usize> {
        self.options.as_ref().and_then(|o| o.rx_buffer)
    }

    /// Forget everything, as after a disconnect
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::{parse, FirmwareKind};

    #[test]
    fn test_apply_grbl_stream() {
        let mut state = ControllerState::new();
        for line in [
            "Grbl 1.1h ['$' for help]",
            "[OPT:V,15,128]",
            "$110=500.000",
            "[GC:G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0]",
            "<Hold:0|MPos:1.000,2.000,3.000|FS:0,0>",
        ] {
            state.apply(&parse(FirmwareKind::Grbl, line));
        }

        assert_eq!(state.banner.as_ref().unwrap().version, "1.1h");
        assert_eq!(state.advertised_rx_buffer(), Some(128));
        assert_eq!(state.settings.get("$110").map(String::as_str), Some("500.000"));
        assert_eq!(state.parser_state.len(), 11);
        assert!(state.machine_hold());
    }

    #[test]
    fn test_boot_banner_clears_status() {
        let mut state = ControllerState::new();
        state.apply(&parse(FirmwareKind::Grbl, "<Hold:0|MPos:0,0,0>"));
        assert!(state.machine_hold());

        state.apply(&parse(FirmwareKind::Grbl, "Grbl 1.1h ['$' for help]"));
        assert!(!state.machine_hold());
    }

    #[test]
    fn test_tinyg_incremental_status() {
        let mut state = ControllerState::new();
        state.apply(&parse(FirmwareKind::TinyG, r#"{"sr":{"stat":5,"posx":1,"posy":2}}"#));
        state.apply(&parse(FirmwareKind::TinyG, r#"{"sr":{"posx":4}}"#));

        let pos = state.status.work_position.unwrap();
        assert_eq!(pos.x, Some(4.0));
        assert_eq!(pos.y, Some(2.0));
        assert_eq!(state.status.state.as_deref(), Some("Run"));
    }
}
