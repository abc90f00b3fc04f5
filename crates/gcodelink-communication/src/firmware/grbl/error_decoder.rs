//! Grbl error and alarm code tables
//!
//! Smoothieware reuses the Grbl numbering for its Grbl-compatible mode, so
//! both families decode through these tables.

/// Meaning of a Grbl `error:<n>` code
pub fn error_description(code: u32) -> Option<&'static str> {
    let text = match code {
        1 => "Expected command letter",
        2 => "Bad number format",
        3 => "Invalid '$' statement",
        4 => "Negative value",
        5 => "Homing not enabled",
        6 => "Step pulse must be at least 3 microseconds",
        7 => "EEPROM read failed, defaults restored",
        8 => "'$' command requires Idle state",
        9 => "G-code locked out during alarm or jog",
        10 => "Soft limits require homing",
        11 => "Line overflow",
        12 => "Step rate above supported maximum",
        13 => "Safety door opened",
        14 => "Build info or startup line too long",
        15 => "Jog target exceeds machine travel",
        16 => "Invalid jog command",
        17 => "Laser mode requires PWM output",
        20 => "Unsupported or invalid g-code command",
        21 => "Modal group violation",
        22 => "Undefined feed rate",
        23 => "Command requires an integer value",
        24 => "More than one command requires axis words",
        25 => "Repeated g-code word",
        26 => "No axis words for command",
        27 => "Invalid line number",
        28 => "Missing P or L value",
        29 => "Unsupported work coordinate system",
        30 => "G53 requires G0 or G1",
        31 => "Unused axis words with G80 active",
        32 => "Arc without axis words in plane",
        33 => "Invalid motion target",
        34 => "Arc radius error",
        35 => "Arc missing IJK offset",
        36 => "Unused g-code words",
        37 => "Tool length offset on wrong axis",
        38 => "Tool number exceeds maximum",
        _ => return None,
    };
    Some(text)
}

/// Meaning of a Grbl `ALARM:<n>` code
pub fn alarm_description(code: u32) -> Option<&'static str> {
    let text = match code {
        1 => "Hard limit triggered, re-homing recommended",
        2 => "Soft limit, motion target exceeds machine travel",
        3 => "Reset while in motion, re-homing recommended",
        4 => "Probe fail, probe not in expected initial state",
        5 => "Probe fail, no contact within travel",
        6 => "Homing fail, reset during homing",
        7 => "Homing fail, safety door opened during homing",
        8 => "Homing fail, pull-off did not clear limit switch",
        9 => "Homing fail, limit switch not found",
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error() {
        assert_eq!(error_description(1), Some("Expected command letter"));
        assert_eq!(error_description(9), Some("G-code locked out during alarm or jog"));
        assert_eq!(error_description(18), None);
        assert_eq!(error_description(255), None);
    }

    #[test]
    fn test_decode_alarm() {
        assert!(alarm_description(1).unwrap().contains("Hard limit"));
        assert!(alarm_description(2).unwrap().contains("Soft limit"));
        assert_eq!(alarm_description(10), None);
    }
}
