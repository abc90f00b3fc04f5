use gcodelink_communication::{parse, FirmwareKind, ParsedEvent};

fn marlin(line: &str) -> ParsedEvent {
    parse(FirmwareKind::Marlin, line)
}

#[test]
fn test_ok_with_piggyback() {
    assert_eq!(marlin("ok T:21.3 /0.0 B:20.9 /0.0"), ParsedEvent::Ok);
    assert_eq!(marlin("ok N12 P15 B3"), ParsedEvent::Ok);
}

#[test]
fn test_error_lines() {
    let ParsedEvent::Error(error) = marlin("Error:No Checksum with line number, Last Line: 7")
    else {
        panic!("expected error");
    };
    assert_eq!(error.message, "No Checksum with line number, Last Line: 7");
    assert_eq!(error.description, None);
}

#[test]
fn test_fatal_errors_are_alarms() {
    let ParsedEvent::Alarm(alarm) = marlin("Error:Printer halted. kill() called!") else {
        panic!("expected alarm");
    };
    assert_eq!(alarm.message, "Printer halted. kill() called!");
    assert!(matches!(
        marlin("Error:Heating failed, system stopped! Heater_ID: 0"),
        ParsedEvent::Alarm(_)
    ));
}

#[test]
fn test_startup_lines() {
    let ParsedEvent::Startup(banner) = marlin("start") else {
        panic!("expected startup");
    };
    assert!(banner.boot);

    let ParsedEvent::Startup(banner) = marlin(
        "FIRMWARE_NAME:Marlin 2.1.2.1 (Jun  1 2023 12:00:00) SOURCE_CODE_URL:github.com/MarlinFirmware/Marlin",
    ) else {
        panic!("expected startup");
    };
    assert_eq!(banner.firmware, "Marlin");
    assert_eq!(banner.version, "2.1.2.1");
    assert!(!banner.boot);
}

#[test]
fn test_host_messages() {
    assert_eq!(
        marlin("echo:busy: processing"),
        ParsedEvent::Echo {
            message: "busy: processing".to_string()
        }
    );
    assert_eq!(
        marlin("//action:pause"),
        ParsedEvent::Action {
            action: "pause".to_string()
        }
    );
    assert_eq!(
        marlin("// bed leveling failed"),
        ParsedEvent::Feedback {
            message: "bed leveling failed".to_string()
        }
    );
}

#[test]
fn test_position_report() {
    let ParsedEvent::StatusReport(report) =
        marlin("X:10.00 Y:0.00 Z:5.00 E:0.00 Count X:800 Y:0 Z:2000")
    else {
        panic!("expected status report");
    };
    let pos = report.machine_position.unwrap();
    assert_eq!(pos.x, Some(10.0));
    assert_eq!(pos.z, Some(5.0));
    assert_eq!(report.state, None);
    assert!(report.extra.contains_key("E"));
}

#[test]
fn test_temperature_report() {
    let ParsedEvent::StatusReport(report) = marlin("T:210.0 /215.0 B:60.0 /60.0 @:127 B@:0") else {
        panic!("expected status report");
    };
    assert_eq!(report.temperatures.len(), 2);
    assert_eq!(report.temperatures[0].heater, "T");
    assert_eq!(report.temperatures[0].current, 210.0);
    assert_eq!(report.temperatures[0].target, Some(215.0));
    assert_eq!(report.temperatures[1].heater, "B");
}
