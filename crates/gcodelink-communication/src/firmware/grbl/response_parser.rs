//! Grbl Response Parser
//!
//! Line matchers for Grbl 0.9 and 1.1 output: status reports, `ok`,
//! `error:`/`ALARM:` codes, bracketed `$#`/`$G`/`$I` reports, `$` settings
//! and the boot banner.

use super::error_decoder::{alarm_description, error_description};
use super::status_parser::StatusParser;
use crate::firmware::common::{self, bracketed};
use crate::firmware::response::{BuildOptions, ParsedEvent, StartupBanner, VersionInfo};

/// Names reported by `$#`
const PARAMETER_NAMES: [&str; 11] = [
    "G54", "G55", "G56", "G57", "G58", "G59", "G28", "G30", "G92", "TLO", "PRB",
];

/// `<Idle|MPos:...>`
pub fn status(line: &str) -> Option<ParsedEvent> {
    StatusParser::parse(line).map(ParsedEvent::StatusReport)
}

/// `error:<n>` with the code decoded
pub fn error(line: &str) -> Option<ParsedEvent> {
    let mut message = common::message_after(line, "error:")?;
    message.description = message
        .code
        .and_then(error_description)
        .map(str::to_string);
    Some(ParsedEvent::Error(message))
}

/// `ALARM:<n>` with the code decoded
pub fn alarm(line: &str) -> Option<ParsedEvent> {
    let mut message = common::message_after(line, "alarm:")?;
    message.description = message
        .code
        .and_then(alarm_description)
        .map(str::to_string);
    Some(ParsedEvent::Alarm(message))
}

/// `[GC:G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0]`
pub fn parser_state(line: &str) -> Option<ParsedEvent> {
    let words = bracketed(line)?.strip_prefix("GC:")?;
    Some(ParsedEvent::ParserState {
        modal: words.split_whitespace().map(str::to_string).collect(),
    })
}

/// `[G54:0.000,0.000,0.000]`, `[TLO:0.000]`, `[PRB:0.000,0.000,0.000:1]`
pub fn parameters(line: &str) -> Option<ParsedEvent> {
    let (name, value) = bracketed(line)?.split_once(':')?;
    PARAMETER_NAMES.contains(&name).then(|| ParsedEvent::Parameters {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// `[VER:1.1h.20190825:<build string>]`
pub fn version(line: &str) -> Option<ParsedEvent> {
    let rest = bracketed(line)?.strip_prefix("VER:")?;
    let (version, build) = match rest.split_once(':') {
        Some((version, build)) => (version, Some(build)),
        None => (rest, None),
    };
    Some(ParsedEvent::Version(VersionInfo {
        version: version.to_string(),
        build: build.filter(|b| !b.is_empty()).map(str::to_string),
        mcu: None,
        clock: None,
    }))
}

/// `[OPT:V,15,128]`
pub fn option(line: &str) -> Option<ParsedEvent> {
    let rest = bracketed(line)?.strip_prefix("OPT:")?;
    let mut parts = rest.split(',');
    let codes = parts.next().unwrap_or_default().to_string();
    let planner_blocks = parts.next().and_then(|v| v.trim().parse().ok());
    let rx_buffer = parts.next().and_then(|v| v.trim().parse().ok());
    Some(ParsedEvent::Option(BuildOptions {
        codes,
        planner_blocks,
        rx_buffer,
    }))
}

/// `[echo:G1X10]`
pub fn echo(line: &str) -> Option<ParsedEvent> {
    let message = bracketed(line)?.strip_prefix("echo:")?;
    Some(ParsedEvent::Echo {
        message: message.to_string(),
    })
}

/// Any other bracketed line, `[MSG:...]` prefix removed
pub fn feedback(line: &str) -> Option<ParsedEvent> {
    let inner = bracketed(line)?;
    let message = inner.strip_prefix("MSG:").unwrap_or(inner);
    Some(ParsedEvent::Feedback {
        message: message.trim().to_string(),
    })
}

/// `$110=1000.000`, `$N0=G54`, 0.9 style `$0=10 (step pulse, usec)`
pub fn settings(line: &str) -> Option<ParsedEvent> {
    let (name, value) = line.strip_prefix('$')?.split_once('=')?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let value = match value.find(" (") {
        Some(idx) if value.ends_with(')') => &value[..idx],
        _ => value,
    };
    Some(ParsedEvent::Settings {
        name: format!("${}", name),
        value: value.trim().to_string(),
    })
}

/// `Grbl 1.1h ['$' for help]`
pub fn startup(line: &str) -> Option<ParsedEvent> {
    let (firmware, rest) = line.split_once(' ')?;
    if !firmware.starts_with("Grbl") {
        return None;
    }
    let (version, help) = match rest.split_once('[') {
        Some((version, help)) => (version, help.strip_suffix(']')),
        None => (rest, None),
    };
    let version = version.trim();
    if !version.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(ParsedEvent::Startup(StartupBanner {
        firmware: firmware.to_string(),
        version: version.to_string(),
        help: help.map(str::to_string),
        boot: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_decoded() {
        let Some(ParsedEvent::Error(err)) = error("error:22") else {
            panic!("expected error");
        };
        assert_eq!(err.code, Some(22));
        assert_eq!(err.description.as_deref(), Some("Undefined feed rate"));

        let Some(ParsedEvent::Error(err)) = error("error: Bad number format") else {
            panic!("expected error");
        };
        assert_eq!(err.code, None);
        assert_eq!(err.message, "Bad number format");
    }

    #[test]
    fn test_settings_variants() {
        assert_eq!(
            settings("$0=10 (step pulse, usec)"),
            Some(ParsedEvent::Settings {
                name: "$0".to_string(),
                value: "10".to_string()
            })
        );
        assert_eq!(
            settings("$N0="),
            Some(ParsedEvent::Settings {
                name: "$N0".to_string(),
                value: String::new()
            })
        );
        assert_eq!(settings("$$"), None);
        assert_eq!(settings("$ X=1"), None);
    }

    #[test]
    fn test_startup_requires_version() {
        let Some(ParsedEvent::Startup(banner)) = startup("Grbl 1.1h ['$' for help]") else {
            panic!("expected banner");
        };
        assert_eq!(banner.firmware, "Grbl");
        assert_eq!(banner.version, "1.1h");
        assert_eq!(banner.help.as_deref(), Some("'$' for help"));
        assert!(banner.boot);

        assert_eq!(startup("Grbl is great"), None);
        assert_eq!(startup("Marlin 2.0"), None);
    }

    #[test]
    fn test_parameters_only_known_names() {
        assert!(parameters("[PRB:0.000,0.000,-1.500:1]").is_some());
        assert!(parameters("[MSG:Caution: Unlocked]").is_none());
    }
}
