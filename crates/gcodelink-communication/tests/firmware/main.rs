//! Response parsing per firmware family

mod grbl;
mod marlin;
mod smoothie;
mod tinyg;

use gcodelink_communication::{parse, FirmwareKind, ParsedEvent};

#[test]
fn test_ok_for_every_firmware() {
    for kind in FirmwareKind::ALL {
        assert_eq!(parse(kind, "ok"), ParsedEvent::Ok, "{}", kind);
        assert_eq!(parse(kind, "ok\r\n"), ParsedEvent::Ok, "{}", kind);
    }
}

#[test]
fn test_alarm_for_every_firmware() {
    for kind in FirmwareKind::ALL {
        let ParsedEvent::Alarm(alarm) = parse(kind, "ALARM:Hard limit") else {
            panic!("{} did not parse the alarm", kind);
        };
        assert_eq!(alarm.message, "Hard limit");
        assert_eq!(alarm.code, None);
    }
}

#[test]
fn test_garbage_is_unrecognized_verbatim() {
    for kind in FirmwareKind::ALL {
        assert_eq!(
            parse(kind, "random garbage"),
            ParsedEvent::Unrecognized {
                raw: "random garbage".to_string()
            }
        );
    }
}

#[test]
fn test_parsed_event_serialization() {
    let json = serde_json::to_value(parse(FirmwareKind::Grbl, "[echo:G0X1]")).unwrap();
    assert_eq!(json["kind"], "Echo");
    assert_eq!(json["payload"]["message"], "G0X1");
}
