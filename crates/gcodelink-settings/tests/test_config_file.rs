use gcodelink_communication::{FirmwareKind, FlowControl};
use gcodelink_settings::{Config, ConfigError, FlowPolicy};
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_full_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[connection]
port = "/dev/ttyUSB0"
baud_rate = 250000
firmware = "tinyg"

[streaming]
flow_control = "byte-counted"
buffer_capacity = 254
status_poll_ms = 100
stall_timeout_ms = 5000

[logging]
level = "gcodelink=debug"
json = true
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.connection.firmware, FirmwareKind::TinyG);
    assert_eq!(config.streaming.flow_control, Some(FlowPolicy::ByteCounted));
    assert!(config.logging.json);

    let session = config.session_config();
    assert_eq!(session.baud_rate, 250000);
    assert_eq!(
        session.flow_control,
        Some(FlowControl::ByteCounted { capacity: 254 })
    );
    assert_eq!(session.status_poll_interval, Duration::from_millis(100));
    assert_eq!(session.stall_timeout, Duration::from_secs(5));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_file_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[connection\nport = ").unwrap();

    let err = Config::load(&path).unwrap_err();
    let ConfigError::Parse { path: reported, .. } = err else {
        panic!("expected parse error, got {:?}", err);
    };
    assert_eq!(reported, path);
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("invalid.toml");
    std::fs::write(&path, "[streaming]\nstall_timeout_ms = 0\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { ref key, .. } if key == "streaming.stall_timeout_ms"));
}
