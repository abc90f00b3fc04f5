use gcodelink_communication::firmware::Acknowledgment;
use gcodelink_communication::{parse, FirmwareKind, ParsedEvent};

fn tinyg(line: &str) -> ParsedEvent {
    parse(FirmwareKind::TinyG, line)
}

#[test]
fn test_startup_report() {
    let ParsedEvent::Startup(banner) = tinyg(
        r#"{"r":{"fv":0.970,"fb":440.20,"hp":1,"hv":8,"id":"2X2660-EVM","msg":"SYSTEM READY"},"f":[1,0,0,0]}"#,
    ) else {
        panic!("expected startup");
    };
    assert_eq!(banner.firmware, "TinyG");
    assert_eq!(banner.version, "0.97");
}

#[test]
fn test_receive_report_acknowledges() {
    let event = tinyg(r#"{"r":{"gc":"g0x1","n":12},"f":[1,0,8,4529]}"#);
    let ParsedEvent::ReceiveReport(report) = &event else {
        panic!("expected receive report");
    };
    assert_eq!(report.status_code, Some(0));
    assert_eq!(report.line_number, Some(12));
    assert_eq!(event.acknowledgment(), Some(Acknowledgment::Ok));
}

#[test]
fn test_nonzero_status_is_an_error() {
    let event = tinyg(r#"{"r":{"mfo":1.5},"f":[1,40,6]}"#);
    assert!(matches!(event, ParsedEvent::ReceiveReport(_)));
    assert_eq!(
        event.acknowledgment(),
        Some(Acknowledgment::Error("status code 40".to_string()))
    );
}

#[test]
fn test_overrides_and_power_management() {
    let ParsedEvent::Overrides { overrides, footer } =
        tinyg(r#"{"r":{"mfo":1.2,"sso":0.8},"f":[1,0,10]}"#)
    else {
        panic!("expected overrides");
    };
    assert_eq!(overrides.feed, Some(1.2));
    assert_eq!(overrides.traverse, None);
    assert_eq!(overrides.spindle, Some(0.8));
    assert_eq!(footer.status_code, 0);

    assert!(matches!(
        tinyg(r#"{"r":{"pwr":{"1":0.5}},"f":[1,0,9]}"#),
        ParsedEvent::PowerManagement { .. }
    ));
}

#[test]
fn test_status_and_queue_reports() {
    let ParsedEvent::StatusReport(report) = tinyg(r#"{"sr":{"stat":6,"posx":2.5}}"#) else {
        panic!("expected status report");
    };
    assert!(report.is_hold());
    assert_eq!(report.work_position.unwrap().x, Some(2.5));

    let ParsedEvent::StatusReport(report) = tinyg(r#"{"qr":28}"#) else {
        panic!("expected queue report");
    };
    assert_eq!(report.buffer.unwrap().planner_blocks, Some(28));
    assert_eq!(tinyg(r#"{"qr":28}"#).acknowledgment(), None);
}

#[test]
fn test_invalid_json_falls_through() {
    assert_eq!(
        tinyg("{not json"),
        ParsedEvent::Unrecognized {
            raw: "{not json".to_string()
        }
    );
}
