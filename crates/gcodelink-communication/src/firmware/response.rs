//! Typed firmware responses
//!
//! Every line received from a controller becomes exactly one [`ParsedEvent`].
//! Events serialize as `{"kind": ..., "payload": ...}` so observers outside
//! the process can consume them without knowing the Rust types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One classified response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum ParsedEvent {
    /// `ALARM:<message>`
    Alarm(FirmwareMessage),
    /// Firmware echo of a command or informational text
    Echo {
        /// Echoed text
        message: String,
    },
    /// Bracketed or comment-style informational line
    Feedback {
        /// Message text without brackets or prefix
        message: String,
    },
    /// Command acknowledgment
    Ok,
    /// Grbl `[OPT:...]` build options
    Option(BuildOptions),
    /// Boot banner or identification response
    Startup(StartupBanner),
    /// `error:<message>` in any casing
    Error(FirmwareMessage),
    /// Machine status (position, state, buffers, temperatures)
    StatusReport(StatusReport),
    /// TinyG manual override factors
    Overrides {
        /// Override factors
        overrides: Overrides,
        /// Response footer
        footer: Footer,
    },
    /// TinyG power management report
    PowerManagement {
        /// The `pwr` object as reported
        report: Value,
        /// Response footer
        footer: Footer,
    },
    /// TinyG response to a submitted line
    ReceiveReport(ReceiveReport),
    /// Firmware setting (`$n=value`)
    Settings {
        /// Setting key, e.g. `$110` or `$N0`
        name: String,
        /// Raw value text
        value: String,
    },
    /// Grbl `[GC:...]` modal state
    ParserState {
        /// Active modal words in report order
        modal: Vec<String>,
    },
    /// Grbl coordinate parameters (`[G54:...]`, `[PRB:...]`, ...)
    Parameters {
        /// Parameter name, e.g. `G54` or `PRB`
        name: String,
        /// Raw value text
        value: String,
    },
    /// Version or build information
    Version(VersionInfo),
    /// Marlin host action (`//action:pause`)
    Action {
        /// Action name
        action: String,
    },
    /// Line no matcher claimed, kept verbatim
    Unrecognized {
        /// The raw line as received
        raw: String,
    },
}

/// Discriminant of a [`ParsedEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Alarm,
    Echo,
    Feedback,
    Ok,
    Option,
    Startup,
    Error,
    StatusReport,
    Overrides,
    PowerManagement,
    ReceiveReport,
    Settings,
    ParserState,
    Parameters,
    Version,
    Action,
    Unrecognized,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How an event settles the oldest in-flight command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgment {
    /// Command accepted
    Ok,
    /// Command rejected with the firmware's message
    Error(String),
}

impl ParsedEvent {
    /// The event's kind
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Alarm(_) => EventKind::Alarm,
            Self::Echo { .. } => EventKind::Echo,
            Self::Feedback { .. } => EventKind::Feedback,
            Self::Ok => EventKind::Ok,
            Self::Option(_) => EventKind::Option,
            Self::Startup(_) => EventKind::Startup,
            Self::Error(_) => EventKind::Error,
            Self::StatusReport(_) => EventKind::StatusReport,
            Self::Overrides { .. } => EventKind::Overrides,
            Self::PowerManagement { .. } => EventKind::PowerManagement,
            Self::ReceiveReport(_) => EventKind::ReceiveReport,
            Self::Settings { .. } => EventKind::Settings,
            Self::ParserState { .. } => EventKind::ParserState,
            Self::Parameters { .. } => EventKind::Parameters,
            Self::Version(_) => EventKind::Version,
            Self::Action { .. } => EventKind::Action,
            Self::Unrecognized { .. } => EventKind::Unrecognized,
        }
    }

    /// Whether this event settles the oldest in-flight command
    ///
    /// TinyG answers every line with an `r` object whose footer carries the
    /// status code; a zero code is an acceptance.
    pub fn acknowledgment(&self) -> Option<Acknowledgment> {
        match self {
            Self::Ok => Some(Acknowledgment::Ok),
            Self::Error(err) => Some(Acknowledgment::Error(err.to_string())),
            Self::Overrides { .. } | Self::PowerManagement { .. } => Some(Acknowledgment::Ok),
            Self::ReceiveReport(report) => match report.status_code {
                None | Some(0) => Some(Acknowledgment::Ok),
                Some(code) => Some(Acknowledgment::Error(format!("status code {}", code))),
            },
            _ => None,
        }
    }

    /// Whether the firmware has announced itself
    ///
    /// Smoothie answers the `version` handshake with a version line rather
    /// than a banner, so version information counts too.
    pub fn is_ready_signal(&self) -> bool {
        matches!(self, Self::Startup(_) | Self::Version(_))
    }
}

/// Alarm or error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareMessage {
    /// Numeric code when the firmware reports one
    pub code: Option<u32>,
    /// Text after the `ALARM:`/`error:` prefix, verbatim
    pub message: String,
    /// Human readable meaning of `code`
    pub description: Option<String>,
}

impl FirmwareMessage {
    /// Message without a numeric code
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            description: None,
        }
    }
}

impl fmt::Display for FirmwareMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", self.message, description),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Grbl compile-time options from `[OPT:...]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Option letter codes, e.g. `VZL`
    pub codes: String,
    /// Planner buffer size in blocks
    pub planner_blocks: Option<u32>,
    /// Serial receive buffer size in bytes
    pub rx_buffer: Option<usize>,
}

/// Identification line emitted at boot or on request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupBanner {
    /// Firmware name as printed
    pub firmware: String,
    /// Version token
    pub version: String,
    /// Help hint, e.g. `'$' for help`
    pub help: Option<String>,
    /// The firmware has just reset and discarded its buffers
    pub boot: bool,
}

/// Version and build details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Version string
    pub version: String,
    /// Build string or date
    pub build: Option<String>,
    /// Microcontroller
    pub mcu: Option<String>,
    /// System clock
    pub clock: Option<String>,
}

/// Axis coordinates; axes the firmware did not report are `None`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
}

impl Position {
    /// Parse a comma separated coordinate list (`x,y,z[,a[,b[,c]]]`)
    ///
    /// At least three numeric coordinates are required.
    pub fn parse(list: &str) -> Option<Self> {
        let coords = list
            .split(',')
            .map(|s| s.trim().parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>()?;

        if coords.len() < 3 {
            return None;
        }

        Some(Self {
            x: Some(coords[0]),
            y: Some(coords[1]),
            z: Some(coords[2]),
            a: coords.get(3).copied(),
            b: coords.get(4).copied(),
            c: coords.get(5).copied(),
        })
    }

    /// Whether no axis is set
    pub fn is_empty(&self) -> bool {
        self.axes().iter().all(Option::is_none)
    }

    /// Overwrite axes that `other` reports
    pub fn merge(&mut self, other: &Position) {
        fn take(dst: &mut Option<f64>, src: Option<f64>) {
            if src.is_some() {
                *dst = src;
            }
        }
        take(&mut self.x, other.x);
        take(&mut self.y, other.y);
        take(&mut self.z, other.z);
        take(&mut self.a, other.a);
        take(&mut self.b, other.b);
        take(&mut self.c, other.c);
    }

    fn axes(&self) -> [Option<f64>; 6] {
        [self.x, self.y, self.z, self.a, self.b, self.c]
    }
}

/// Planner and receive buffer availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferState {
    /// Free planner blocks (TinyG: queue report)
    pub planner_blocks: Option<u32>,
    /// Free receive buffer bytes
    pub rx_bytes: Option<u32>,
}

/// Override factors
///
/// Grbl reports whole percentages, TinyG reports factors where 1.0 is 100%.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Overrides {
    /// Feed override
    pub feed: Option<f64>,
    /// Rapid/traverse override
    pub traverse: Option<f64>,
    /// Spindle override
    pub spindle: Option<f64>,
}

impl Overrides {
    /// Whether no factor is set
    pub fn is_empty(&self) -> bool {
        self.feed.is_none() && self.traverse.is_none() && self.spindle.is_none()
    }
}

/// Heater reading from a Marlin temperature report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    /// Heater name, e.g. `T`, `T1`, `B`
    pub heater: String,
    /// Measured temperature
    pub current: f64,
    /// Target temperature
    pub target: Option<f64>,
}

/// TinyG response footer `f:[revision, status, rx]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    /// Footer revision
    pub revision: u64,
    /// Status code, 0 for success
    pub status_code: u64,
    /// Receive buffer information (free bytes or line length)
    pub rx_info: Option<u64>,
}

impl Footer {
    /// Parse a footer array
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        Some(Self {
            revision: items.first()?.as_u64()?,
            status_code: items.get(1)?.as_u64()?,
            rx_info: items.get(2).and_then(Value::as_u64),
        })
    }
}

/// TinyG `r` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveReport {
    /// Footer status code
    pub status_code: Option<u64>,
    /// Line number echoed back in `r.n`
    pub line_number: Option<u64>,
    /// The `r` object
    pub body: Value,
    /// Response footer
    pub footer: Option<Footer>,
    /// Status report requested through the line (`{"sr":null}`)
    pub status: Option<StatusReport>,
}

/// Snapshot of the machine as reported by the firmware
///
/// Fields are optional because firmware report incrementally: TinyG only
/// sends changed values and Grbl omits `WCO`/`Ov` on most reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusReport {
    /// Machine state name, e.g. `Idle`, `Run`, `Hold:0`
    pub state: Option<String>,
    pub machine_position: Option<Position>,
    pub work_position: Option<Position>,
    pub work_coordinate_offset: Option<Position>,
    pub feed_rate: Option<f64>,
    pub spindle_speed: Option<f64>,
    pub buffer: Option<BufferState>,
    /// Line number currently executing
    pub line_number: Option<u64>,
    pub overrides: Option<Overrides>,
    /// Marlin heater readings
    pub temperatures: Vec<Temperature>,
    /// Fields this crate does not model (`Pn`, `A`, TinyG extras)
    pub extra: BTreeMap<String, Value>,
}

impl StatusReport {
    /// Whether the firmware reports a feed hold or an open safety door
    pub fn is_hold(&self) -> bool {
        self.state.as_deref().is_some_and(|state| {
            let state = state.to_ascii_lowercase();
            state.starts_with("hold") || state.starts_with("door")
        })
    }

    /// Fold an incremental report into this one
    pub fn merge(&mut self, update: &StatusReport) {
        if update.state.is_some() {
            self.state = update.state.clone();
        }
        merge_position(&mut self.machine_position, update.machine_position);
        merge_position(&mut self.work_position, update.work_position);
        merge_position(
            &mut self.work_coordinate_offset,
            update.work_coordinate_offset,
        );
        if update.feed_rate.is_some() {
            self.feed_rate = update.feed_rate;
        }
        if update.spindle_speed.is_some() {
            self.spindle_speed = update.spindle_speed;
        }
        if update.buffer.is_some() {
            self.buffer = update.buffer;
        }
        if update.line_number.is_some() {
            self.line_number = update.line_number;
        }
        if update.overrides.is_some() {
            self.overrides = update.overrides;
        }
        if !update.temperatures.is_empty() {
            self.temperatures = update.temperatures.clone();
        }
        for (key, value) in &update.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

fn merge_position(dst: &mut Option<Position>, src: Option<Position>) {
    match (dst.as_mut(), src) {
        (Some(current), Some(update)) => current.merge(&update),
        (None, Some(update)) => *dst = Some(update),
        _ => {}
    }
}
