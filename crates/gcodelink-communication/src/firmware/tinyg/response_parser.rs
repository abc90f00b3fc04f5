//! TinyG Response Parser
//!
//! TinyG answers in JSON. A single line may carry a receive report (`r`),
//! a status report (`sr`), a queue report (`qr`) or an exception (`er`),
//! followed by a footer `f:[revision, status, rx]`. Each sub-object is
//! optional and decoded independently.

use crate::firmware::response::{
    BufferState, Footer, Overrides, ParsedEvent, Position, ReceiveReport, StartupBanner,
    StatusReport,
};
use serde_json::{Map, Value};

/// Decode one JSON line
///
/// Invalid JSON and objects with nothing recognisable return `None` so the
/// text matchers (and finally `Unrecognized`) get their turn.
pub fn json_report(line: &str) -> Option<ParsedEvent> {
    if !line.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(line).ok()?;
    let object = value.as_object()?;
    let footer = object.get("f").and_then(Footer::from_value);
    let body = object.get("r").and_then(Value::as_object);

    if let Some(event) = body.and_then(startup) {
        return Some(event);
    }

    let footer_ok = footer.is_some_and(|f| f.status_code == 0);
    if let Some(footer) = footer.filter(|_| footer_ok) {
        let pwr = body.and_then(|r| r.get("pwr")).or_else(|| object.get("pwr"));
        if let Some(report) = pwr {
            return Some(ParsedEvent::PowerManagement {
                report: report.clone(),
                footer,
            });
        }
        if let Some(overrides) = body.and_then(overrides) {
            return Some(ParsedEvent::Overrides { overrides, footer });
        }
    }

    if let Some(sr) = object.get("sr").and_then(Value::as_object) {
        return Some(ParsedEvent::StatusReport(status_report(sr)));
    }

    if let Some(qr) = object.get("qr").and_then(Value::as_u64) {
        return Some(ParsedEvent::StatusReport(StatusReport {
            buffer: Some(BufferState {
                planner_blocks: u32::try_from(qr).ok(),
                rx_bytes: None,
            }),
            ..Default::default()
        }));
    }

    if let Some(er) = object.get("er").and_then(Value::as_object) {
        let message = er
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("exception report");
        return Some(ParsedEvent::Feedback {
            message: message.to_string(),
        });
    }

    let r = object.get("r")?;
    Some(ParsedEvent::ReceiveReport(ReceiveReport {
        status_code: footer.map(|f| f.status_code),
        line_number: body.and_then(|r| r.get("n")).and_then(Value::as_u64),
        body: r.clone(),
        footer,
        status: body
            .and_then(|r| r.get("sr"))
            .and_then(Value::as_object)
            .map(status_report),
    }))
}

/// `{"r":{"fv":0.97,...,"msg":"SYSTEM READY"}}`
fn startup(body: &Map<String, Value>) -> Option<ParsedEvent> {
    let version = body.get("fv")?;
    if body.get("msg").and_then(Value::as_str) != Some("SYSTEM READY") {
        return None;
    }
    let version = match version {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(ParsedEvent::Startup(StartupBanner {
        firmware: "TinyG".to_string(),
        version,
        help: None,
        boot: true,
    }))
}

/// `mfo` (feed), `mto` (traverse), `sso` (spindle)
fn overrides(body: &Map<String, Value>) -> Option<Overrides> {
    let overrides = Overrides {
        feed: body.get("mfo").and_then(Value::as_f64),
        traverse: body.get("mto").and_then(Value::as_f64),
        spindle: body.get("sso").and_then(Value::as_f64),
    };
    (!overrides.is_empty()).then_some(overrides)
}

/// Decode an `sr` object; only changed fields are present
pub fn status_report(sr: &Map<String, Value>) -> StatusReport {
    let mut report = StatusReport::default();
    let mut work = Position::default();
    let mut machine = Position::default();
    let mut offset = Position::default();

    for (key, value) in sr {
        let number = value.as_f64();
        match key.as_str() {
            "stat" => report.state = value.as_u64().map(machine_state).map(str::to_string),
            "line" | "n" => report.line_number = value.as_u64(),
            "feed" => report.feed_rate = number,
            "sps" => report.spindle_speed = number,
            _ => {
                if let Some(axis) = key.strip_prefix("pos") {
                    set_axis(&mut work, axis, number);
                } else if let Some(axis) = key.strip_prefix("mpo") {
                    set_axis(&mut machine, axis, number);
                } else if let Some(axis) = key.strip_prefix("ofs") {
                    set_axis(&mut offset, axis, number);
                } else {
                    report.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    report.work_position = (!work.is_empty()).then_some(work);
    report.machine_position = (!machine.is_empty()).then_some(machine);
    report.work_coordinate_offset = (!offset.is_empty()).then_some(offset);
    report
}

fn set_axis(pos: &mut Position, axis: &str, value: Option<f64>) {
    match axis {
        "x" => pos.x = value,
        "y" => pos.y = value,
        "z" => pos.z = value,
        "a" => pos.a = value,
        "b" => pos.b = value,
        "c" => pos.c = value,
        _ => {}
    }
}

/// Name of a TinyG `stat` code
pub fn machine_state(code: u64) -> &'static str {
    match code {
        0 => "Initializing",
        1 => "Ready",
        2 => "Alarm",
        3 => "Stop",
        4 => "End",
        5 => "Run",
        6 => "Hold",
        7 => "Probe",
        8 => "Cycle",
        9 => "Homing",
        10 => "Jog",
        11 => "Interlock",
        12 => "Shutdown",
        13 => "Panic",
        _ => "Unknown",
    }
}
