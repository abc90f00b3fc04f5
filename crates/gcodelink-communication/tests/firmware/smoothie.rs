use gcodelink_communication::{parse, FirmwareKind, ParsedEvent};

fn smoothie(line: &str) -> ParsedEvent {
    parse(FirmwareKind::Smoothie, line)
}

#[test]
fn test_version_line() {
    let ParsedEvent::Version(info) = smoothie(
        "Build version: edge-94de12c, Build date: Oct 28 2014 13:24:47, MCU: LPC1769, System Clock: 120MHz",
    ) else {
        panic!("expected version");
    };
    assert_eq!(info.version, "edge-94de12c");
    assert_eq!(info.build.as_deref(), Some("Oct 28 2014 13:24:47"));
    assert_eq!(info.mcu.as_deref(), Some("LPC1769"));
    assert_eq!(info.clock.as_deref(), Some("120MHz"));
}

#[test]
fn test_version_without_mcu_falls_through() {
    let line = "Build version: edge-94de12c, Build date: Oct 28 2014 13:24:47, System Clock: 120MHz";
    assert_eq!(
        smoothie(line),
        ParsedEvent::Unrecognized {
            raw: line.to_string()
        }
    );
}

#[test]
fn test_startup_banner() {
    let ParsedEvent::Startup(banner) = smoothie("Smoothie") else {
        panic!("expected startup");
    };
    assert_eq!(banner.firmware, "Smoothie");
    assert!(banner.version.is_empty());

    let ParsedEvent::Startup(banner) = smoothie("Smoothieware edge-3332442") else {
        panic!("expected startup");
    };
    assert_eq!(banner.version, "edge-3332442");
}

#[test]
fn test_grbl_compatible_lines() {
    assert!(matches!(
        smoothie("<Idle|MPos:0.0000,0.0000,0.0000|WPos:0.0000,0.0000,0.0000|F:4000.0,100.0>"),
        ParsedEvent::StatusReport(_)
    ));
    let ParsedEvent::Error(error) = smoothie("error:22") else {
        panic!("expected error");
    };
    assert_eq!(error.description.as_deref(), Some("Undefined feed rate"));
    assert!(matches!(
        smoothie("[G92:0.0000,0.0000,0.0000]"),
        ParsedEvent::Parameters { .. }
    ));
}
