//! Smoothieware response parser
//!
//! Smoothieware speaks the Grbl report dialect and adds its own banner and
//! `version` response. Everything else is delegated to the Grbl matchers.

use crate::firmware::response::{ParsedEvent, StartupBanner, VersionInfo};

/// `Build version: edge-3332442, Build date: xxx, MCU: LPC1769, System Clock: 120MHz`
///
/// The MCU field is required; without it the line is not a version response.
pub fn version(line: &str) -> Option<ParsedEvent> {
    if !line.starts_with("Build version:") {
        return None;
    }

    let mut version = None;
    let mut build = None;
    let mut mcu = None;
    let mut clock = None;
    for field in line.split(',') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "Build version" => version = Some(value),
            "Build date" => build = Some(value),
            "MCU" => mcu = Some(value),
            "System Clock" => clock = Some(value),
            _ => {}
        }
    }

    let mcu = mcu.filter(|m| !m.is_empty())?;
    Some(ParsedEvent::Version(VersionInfo {
        version: version?,
        build,
        mcu: Some(mcu),
        clock,
    }))
}

/// `Smoothie` or `Smoothieware <version>` boot banner
pub fn startup(line: &str) -> Option<ParsedEvent> {
    let mut words = line.split_whitespace();
    let name = words.next()?;
    if name != "Smoothie" && name != "Smoothieware" {
        return None;
    }
    let version = words.collect::<Vec<_>>().join(" ");
    Some(ParsedEvent::Startup(StartupBanner {
        firmware: "Smoothie".to_string(),
        version,
        help: None,
        boot: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_with_mcu() {
        let line = "Build version: edge-94de12c, Build date: Oct 28 2014 13:24:47, MCU: LPC1769, System Clock: 120MHz";
        let Some(ParsedEvent::Version(info)) = version(line) else {
            panic!("expected version");
        };
        assert_eq!(info.version, "edge-94de12c");
        assert_eq!(info.build.as_deref(), Some("Oct 28 2014 13:24:47"));
        assert_eq!(info.mcu.as_deref(), Some("LPC1769"));
        assert_eq!(info.clock.as_deref(), Some("120MHz"));
    }

    #[test]
    fn test_version_without_mcu_rejected() {
        let line = "Build version: edge-94de12c, Build date: Oct 28 2014 13:24:47, System Clock: 120MHz";
        assert_eq!(version(line), None);
        assert_eq!(version("Build version: edge, MCU: "), None);
    }

    #[test]
    fn test_startup_banner() {
        let Some(ParsedEvent::Startup(banner)) = startup("Smoothie") else {
            panic!("expected banner");
        };
        assert_eq!(banner.firmware, "Smoothie");
        assert!(banner.version.is_empty());
        assert_eq!(startup("Smoothies are tasty").map(|e| e.kind()), None);
    }
}
