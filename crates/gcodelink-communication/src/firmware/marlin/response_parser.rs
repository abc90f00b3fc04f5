//! Marlin response parser
//!
//! Marlin acknowledges with `ok` (optionally followed by temperatures or
//! buffer counters), reports with `echo:`/`Error:` prefixes and talks to the
//! host through `//action:` lines.

use crate::firmware::common;
use crate::firmware::response::{ParsedEvent, Position, StartupBanner, StatusReport, Temperature};
use serde_json::Value;

/// `ok`, `ok T:21.3 /0.0`, `ok N12 P15 B3`
pub fn ok(line: &str) -> Option<ParsedEvent> {
    (line == "ok" || line.starts_with("ok ")).then_some(ParsedEvent::Ok)
}

/// Phrases Marlin puts in the `Error:` line it prints before killing itself
const HALT_MARKERS: &[&str] = &["system stopped", "printer halted", "kill() called"];

/// `Error:Heating failed, system stopped! Heater_ID: 0`, `Error:Printer halted. kill() called!`
///
/// These are not replies to a command; the firmware has stopped and needs M999.
pub fn halted(line: &str) -> Option<ParsedEvent> {
    let message = common::message_after(line, "error:")?;
    let lower = message.message.to_ascii_lowercase();
    HALT_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
        .then_some(ParsedEvent::Alarm(message))
}

/// `start` after reset, `FIRMWARE_NAME:Marlin 2.1.2 (...)` in reply to M115
pub fn startup(line: &str) -> Option<ParsedEvent> {
    if line == "start" {
        return Some(ParsedEvent::Startup(StartupBanner {
            firmware: "Marlin".to_string(),
            version: String::new(),
            help: None,
            boot: true,
        }));
    }

    let rest = line.strip_prefix("FIRMWARE_NAME:")?;
    let mut words = rest.split_whitespace();
    let firmware = words.next()?.to_string();
    let version = words
        .next()
        .filter(|v| !v.contains(':'))
        .unwrap_or_default()
        .to_string();
    Some(ParsedEvent::Startup(StartupBanner {
        firmware,
        version,
        help: None,
        boot: false,
    }))
}

/// `echo:<message>`
pub fn echo(line: &str) -> Option<ParsedEvent> {
    let message = line.strip_prefix("echo:")?;
    Some(ParsedEvent::Echo {
        message: message.trim().to_string(),
    })
}

/// `//action:<name>`
pub fn action(line: &str) -> Option<ParsedEvent> {
    let action = line.strip_prefix("//action:")?.trim();
    if action.is_empty() {
        return None;
    }
    Some(ParsedEvent::Action {
        action: action.to_string(),
    })
}

/// `// <message>`
pub fn feedback(line: &str) -> Option<ParsedEvent> {
    let message = line.strip_prefix("//")?;
    Some(ParsedEvent::Feedback {
        message: message.trim().to_string(),
    })
}

/// `X:10.00 Y:0.00 Z:5.00 E:0.00 Count X:800 Y:0 Z:2000` in reply to M114
pub fn position(line: &str) -> Option<ParsedEvent> {
    if !line.starts_with("X:") {
        return None;
    }
    let reported = line.split(" Count").next().unwrap_or(line);

    let mut pos = Position::default();
    let mut report = StatusReport::default();
    for token in reported.split_whitespace() {
        let (axis, value) = token.split_once(':')?;
        let value: f64 = value.parse().ok()?;
        match axis {
            "X" => pos.x = Some(value),
            "Y" => pos.y = Some(value),
            "Z" => pos.z = Some(value),
            "A" => pos.a = Some(value),
            "B" => pos.b = Some(value),
            "C" => pos.c = Some(value),
            other => {
                report.extra.insert(other.to_string(), Value::from(value));
            }
        }
    }

    if pos.x.is_none() || pos.y.is_none() || pos.z.is_none() {
        return None;
    }
    report.machine_position = Some(pos);
    Some(ParsedEvent::StatusReport(report))
}

/// `T:210.0 /210.0 B:60.0 /60.0 @:127 B@:0`, also per-extruder `T0:`/`T1:`
pub fn temperature(line: &str) -> Option<ParsedEvent> {
    if !(line.starts_with("T:") || line.starts_with("T0:") || line.starts_with("B:")) {
        return None;
    }

    let mut temperatures: Vec<Temperature> = Vec::new();
    for token in line.split_whitespace() {
        if let Some(target) = token.strip_prefix('/') {
            if let Some(last) = temperatures.last_mut() {
                last.target = target.parse().ok();
            }
            continue;
        }
        let Some((heater, value)) = token.split_once(':') else {
            continue;
        };
        if !is_heater(heater) {
            continue;
        }
        if let Ok(current) = value.parse::<f64>() {
            temperatures.push(Temperature {
                heater: heater.to_string(),
                current,
                target: None,
            });
        }
    }

    if temperatures.is_empty() {
        return None;
    }
    Some(ParsedEvent::StatusReport(StatusReport {
        temperatures,
        ..Default::default()
    }))
}

fn is_heater(name: &str) -> bool {
    match name.strip_prefix('T') {
        Some(index) => index.chars().all(|c| c.is_ascii_digit()),
        None => matches!(name, "B" | "C" | "P"),
    }
}
