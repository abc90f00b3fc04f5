//! Line parser registry
//!
//! Each firmware family exposes an ordered table of matchers. The registry
//! tries them in order and returns the first match; a line no matcher claims
//! comes back as [`ParsedEvent::Unrecognized`] so it stays observable.

use super::response::ParsedEvent;
use super::{grbl, marlin, smoothieware, tinyg, FirmwareKind};

/// A stateless classifier for one kind of response line
///
/// Matchers receive the line with trailing whitespace removed and return
/// `None` when the line is not theirs, including when a mandatory field is
/// missing.
pub type Matcher = fn(&str) -> Option<ParsedEvent>;

/// Ordered matcher table for a firmware family
pub fn matchers(kind: FirmwareKind) -> &'static [Matcher] {
    match kind {
        FirmwareKind::Grbl => grbl::MATCHERS,
        FirmwareKind::Marlin => marlin::MATCHERS,
        FirmwareKind::Smoothie => smoothieware::MATCHERS,
        FirmwareKind::TinyG => tinyg::MATCHERS,
    }
}

/// Classify one raw response line
pub fn parse(kind: FirmwareKind, raw: &str) -> ParsedEvent {
    let line = raw.trim_end_matches(['\r', '\n', ' ', '\t']);
    matchers(kind)
        .iter()
        .find_map(|matcher| matcher(line))
        .unwrap_or_else(|| ParsedEvent::Unrecognized {
            raw: raw.to_string(),
        })
}

/// Parser bound to one firmware family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineParser {
    kind: FirmwareKind,
}

impl LineParser {
    /// Create a parser for `kind`
    pub fn new(kind: FirmwareKind) -> Self {
        Self { kind }
    }

    /// Firmware family this parser handles
    pub fn kind(&self) -> FirmwareKind {
        self.kind
    }

    /// Classify one raw response line
    pub fn parse(&self, raw: &str) -> ParsedEvent {
        parse(self.kind, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::response::EventKind;

    #[test]
    fn test_every_firmware_has_matchers() {
        for kind in FirmwareKind::ALL {
            assert!(!matchers(kind).is_empty(), "{} has no matchers", kind);
        }
    }

    #[test]
    fn test_ok_and_alarm_for_all_firmware() {
        for kind in FirmwareKind::ALL {
            assert_eq!(parse(kind, "ok"), ParsedEvent::Ok, "{}", kind);

            match parse(kind, "ALARM:Hard limit") {
                ParsedEvent::Alarm(alarm) => assert_eq!(alarm.message, "Hard limit"),
                other => panic!("{}: expected alarm, got {:?}", kind, other),
            }
        }
    }

    #[test]
    fn test_unrecognized_keeps_raw_text() {
        for kind in FirmwareKind::ALL {
            assert_eq!(
                parse(kind, "random garbage"),
                ParsedEvent::Unrecognized {
                    raw: "random garbage".to_string()
                }
            );
        }

        // Trailing whitespace is ignored for matching but kept in the raw text
        assert_eq!(
            parse(FirmwareKind::Grbl, "mystery \r\n"),
            ParsedEvent::Unrecognized {
                raw: "mystery \r\n".to_string()
            }
        );
        assert_eq!(parse(FirmwareKind::Grbl, "ok\r\n"), ParsedEvent::Ok);
    }

    #[test]
    fn test_line_parser() {
        let parser = LineParser::new(FirmwareKind::Marlin);
        assert_eq!(parser.kind(), FirmwareKind::Marlin);
        assert_eq!(parser.parse("echo:busy: processing").kind(), EventKind::Echo);
    }
}
