//! Grbl Status Report Parsing
//!
//! Decodes `<...>` status reports in both wire formats:
//! - Grbl 1.1: `<Run|MPos:1.000,2.000,0.000|Bf:15,128|FS:500,0|WCO:0,0,0>`
//! - Grbl 0.9: `<Idle,MPos:0.000,0.000,0.000,WPos:0.000,0.000,0.000,Buf:0,RX:0>`
//!
//! Smoothieware emits the 1.1 layout with `F:` and `S:` carrying an extra
//! override value, which is ignored.

use crate::firmware::response::{BufferState, Overrides, Position, StatusReport};
use serde_json::Value;

/// Status report parser
pub struct StatusParser;

impl StatusParser {
    /// Parse a complete status line including angle brackets
    pub fn parse(line: &str) -> Option<StatusReport> {
        let body = line.strip_prefix('<')?.strip_suffix('>')?;
        let fields = if body.contains('|') {
            Self::split_pipe_fields(body)
        } else {
            Self::split_comma_fields(body)
        };

        let (state, fields) = fields.split_first()?;
        if !state.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut report = StatusReport {
            state: Some(state.to_string()),
            ..Default::default()
        };
        let mut buffer = BufferState::default();

        for field in fields {
            let Some((key, value)) = field.split_once(':') else {
                continue;
            };
            match key {
                "MPos" => report.machine_position = Position::parse(value),
                "WPos" => report.work_position = Position::parse(value),
                "WCO" => report.work_coordinate_offset = Position::parse(value),
                "Bf" => {
                    let mut parts = value.split(',');
                    buffer.planner_blocks = parts.next().and_then(|v| v.trim().parse().ok());
                    buffer.rx_bytes = parts.next().and_then(|v| v.trim().parse().ok());
                }
                "Buf" => buffer.planner_blocks = value.trim().parse().ok(),
                "RX" => buffer.rx_bytes = value.trim().parse().ok(),
                "FS" => {
                    let mut parts = value.split(',');
                    report.feed_rate = parts.next().and_then(|v| v.trim().parse().ok());
                    report.spindle_speed = parts.next().and_then(|v| v.trim().parse().ok());
                }
                "F" => report.feed_rate = first_number(value),
                "S" => report.spindle_speed = first_number(value),
                "Ln" => report.line_number = value.trim().parse().ok(),
                "Ov" => report.overrides = Self::parse_overrides(value),
                _ => {
                    report
                        .extra
                        .insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }

        if buffer != BufferState::default() {
            report.buffer = Some(buffer);
        }

        // Grbl reports either MPos or WPos depending on $10; derive the other
        // when the offset is known.
        if let Some(wco) = report.work_coordinate_offset {
            match (report.machine_position, report.work_position) {
                (Some(mpos), None) => report.work_position = Some(offset(&mpos, &wco, -1.0)),
                (None, Some(wpos)) => report.machine_position = Some(offset(&wpos, &wco, 1.0)),
                _ => {}
            }
        }

        Some(report)
    }

    /// Parse `Ov:feed,rapid,spindle`
    pub fn parse_overrides(value: &str) -> Option<Overrides> {
        let values = value
            .split(',')
            .map(|v| v.trim().parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>()?;
        if values.len() < 3 {
            return None;
        }
        Some(Overrides {
            feed: Some(values[0]),
            traverse: Some(values[1]),
            spindle: Some(values[2]),
        })
    }

    fn split_pipe_fields(body: &str) -> Vec<String> {
        body.split('|').map(|s| s.trim().to_string()).collect()
    }

    /// Group a 0.9 comma list into `Key:value,value` fields
    fn split_comma_fields(body: &str) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for (index, item) in body.split(',').enumerate() {
            let starts_field = index == 0
                || item
                    .split_once(':')
                    .is_some_and(|(key, _)| !key.is_empty() && key.chars().all(char::is_alphabetic));
            match fields.last_mut() {
                Some(current) if !starts_field => {
                    current.push(',');
                    current.push_str(item);
                }
                _ => fields.push(item.trim().to_string()),
            }
        }
        fields
    }
}

fn first_number(value: &str) -> Option<f64> {
    value.split(',').next()?.trim().parse().ok()
}

fn offset(pos: &Position, wco: &Position, sign: f64) -> Position {
    let apply = |p: Option<f64>, o: Option<f64>| match (p, o) {
        (Some(p), Some(o)) => Some(p + sign * o),
        (p, _) => p,
    };
    Position {
        x: apply(pos.x, wco.x),
        y: apply(pos.y, wco.y),
        z: apply(pos.z, wco.z),
        a: apply(pos.a, wco.a),
        b: apply(pos.b, wco.b),
        c: apply(pos.c, wco.c),
    }
}
