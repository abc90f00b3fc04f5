use gcodelink_communication::firmware::{BuildOptions, Position};
use gcodelink_communication::{parse, FirmwareKind, ParsedEvent};

fn grbl(line: &str) -> ParsedEvent {
    parse(FirmwareKind::Grbl, line)
}

#[test]
fn test_parse_status_report() {
    let ParsedEvent::StatusReport(report) =
        grbl("<Idle|MPos:0.000,0.000,0.000|FS:0,0|WCO:0.000,0.000,0.000>")
    else {
        panic!("expected status report");
    };
    assert_eq!(report.state.as_deref(), Some("Idle"));
    assert_eq!(
        report.machine_position,
        Some(Position {
            x: Some(0.0),
            y: Some(0.0),
            z: Some(0.0),
            ..Default::default()
        })
    );
    assert!(!report.is_hold());
}

#[test]
fn test_parse_hold_and_door_states() {
    let ParsedEvent::StatusReport(hold) = grbl("<Hold:0|MPos:1.000,1.000,0.000|FS:0,0>") else {
        panic!("expected status report");
    };
    assert!(hold.is_hold());

    let ParsedEvent::StatusReport(door) = grbl("<Door:1|MPos:0.000,0.000,0.000|FS:0,0>") else {
        panic!("expected status report");
    };
    assert!(door.is_hold());
}

#[test]
fn test_parse_error_decodes_code() {
    let ParsedEvent::Error(error) = grbl("error:20") else {
        panic!("expected error");
    };
    assert_eq!(error.code, Some(20));
    assert_eq!(error.message, "20");
    assert_eq!(
        error.description.as_deref(),
        Some("Unsupported or invalid g-code command")
    );
}

#[test]
fn test_parse_alarm_decodes_code() {
    let ParsedEvent::Alarm(alarm) = grbl("ALARM:1") else {
        panic!("expected alarm");
    };
    assert_eq!(alarm.code, Some(1));
    assert_eq!(
        alarm.description.as_deref(),
        Some("Hard limit triggered, re-homing recommended")
    );
}

#[test]
fn test_parse_bracketed_lines() {
    assert_eq!(
        grbl("[OPT:VL,15,128]"),
        ParsedEvent::Option(BuildOptions {
            codes: "VL".to_string(),
            planner_blocks: Some(15),
            rx_buffer: Some(128),
        })
    );
    assert_eq!(
        grbl("[GC:G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0]"),
        ParsedEvent::ParserState {
            modal: "G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0"
                .split(' ')
                .map(str::to_string)
                .collect()
        }
    );
    assert_eq!(
        grbl("[G54:4.000,0.000,0.000]"),
        ParsedEvent::Parameters {
            name: "G54".to_string(),
            value: "4.000,0.000,0.000".to_string()
        }
    );
    assert_eq!(
        grbl("[MSG:'$H'|'$X' to unlock]"),
        ParsedEvent::Feedback {
            message: "'$H'|'$X' to unlock".to_string()
        }
    );
    assert_eq!(
        grbl("[echo:G1X0.540Y10.4F100]"),
        ParsedEvent::Echo {
            message: "G1X0.540Y10.4F100".to_string()
        }
    );

    let ParsedEvent::Version(version) = grbl("[VER:1.1h.20190825:My machine]") else {
        panic!("expected version");
    };
    assert_eq!(version.version, "1.1h.20190825");
    assert_eq!(version.build.as_deref(), Some("My machine"));
}

#[test]
fn test_parse_settings() {
    assert_eq!(
        grbl("$110=500.000"),
        ParsedEvent::Settings {
            name: "$110".to_string(),
            value: "500.000".to_string()
        }
    );
    assert_eq!(
        grbl("$N0=G21"),
        ParsedEvent::Settings {
            name: "$N0".to_string(),
            value: "G21".to_string()
        }
    );
}

#[test]
fn test_parse_startup_banner() {
    let ParsedEvent::Startup(banner) = grbl("Grbl 1.1h ['$' for help]") else {
        panic!("expected startup");
    };
    assert_eq!(banner.firmware, "Grbl");
    assert_eq!(banner.version, "1.1h");
    assert!(banner.boot);

    let ParsedEvent::Startup(banner) = grbl("Grbl 0.9j ['$' for help]") else {
        panic!("expected startup");
    };
    assert_eq!(banner.version, "0.9j");
}
