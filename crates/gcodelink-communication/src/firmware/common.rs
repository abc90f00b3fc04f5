//! Matchers shared by every firmware family

use super::response::{FirmwareMessage, ParsedEvent};

/// Strip `prefix` from `line` ignoring ASCII case
pub fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let n = prefix.len();
    if line.len() >= n && line.is_char_boundary(n) && line[..n].eq_ignore_ascii_case(prefix) {
        Some(&line[n..])
    } else {
        None
    }
}

/// `ok`
pub fn ok(line: &str) -> Option<ParsedEvent> {
    line.eq_ignore_ascii_case("ok").then_some(ParsedEvent::Ok)
}

/// `error:<message>` in any casing
pub fn error(line: &str) -> Option<ParsedEvent> {
    message_after(line, "error:").map(ParsedEvent::Error)
}

/// `ALARM:<message>` in any casing
pub fn alarm(line: &str) -> Option<ParsedEvent> {
    message_after(line, "alarm:").map(ParsedEvent::Alarm)
}

/// Split `<prefix><message>` into a [`FirmwareMessage`]
///
/// A purely numeric message also fills `code`; decoding the code is left to
/// the firmware that owns the numbering.
pub fn message_after(line: &str, prefix: &str) -> Option<FirmwareMessage> {
    let message = strip_prefix_ignore_case(line, prefix)?.trim();
    Some(FirmwareMessage {
        code: message.parse::<u32>().ok(),
        message: message.to_string(),
        description: None,
    })
}

/// Inner text of a `[...]` line
pub fn bracketed(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_is_exact() {
        assert_eq!(ok("ok"), Some(ParsedEvent::Ok));
        assert_eq!(ok("OK"), Some(ParsedEvent::Ok));
        assert_eq!(ok("okay"), None);
        assert_eq!(ok("ok T:20"), None);
    }

    #[test]
    fn test_error_any_case() {
        let Some(ParsedEvent::Error(err)) = error("Error:Printer halted") else {
            panic!("expected error");
        };
        assert_eq!(err.message, "Printer halted");
        assert_eq!(err.code, None);

        let Some(ParsedEvent::Error(err)) = error("error:20") else {
            panic!("expected error");
        };
        assert_eq!(err.code, Some(20));
        assert_eq!(err.message, "20");
    }

    #[test]
    fn test_alarm_trims_message() {
        let Some(ParsedEvent::Alarm(alarm)) = alarm("ALARM: Hard/soft limit") else {
            panic!("expected alarm");
        };
        assert_eq!(alarm.message, "Hard/soft limit");
        assert!(super::alarm("alarms are fun").is_none());
    }

    #[test]
    fn test_prefix_on_multibyte_line() {
        assert_eq!(strip_prefix_ignore_case("é", "e:"), None);
        assert_eq!(bracketed("[MSG:Caution]"), Some("MSG:Caution"));
        assert_eq!(bracketed("[MSG:Caution"), None);
    }
}
