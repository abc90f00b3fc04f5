//! Program text preparation
//!
//! Programs are queued line by line. Comments and blank lines are removed;
//! everything else is sent verbatim.

/// Remove `;` and `(...)` comments from one line and trim it
///
/// An unclosed `(` comments out the rest of the line.
pub fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;

    for c in line.chars() {
        match c {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Split a program into sendable lines
///
/// `%` tape markers are dropped along with comments and blank lines.
pub fn program_lines(gcode: &str) -> Vec<String> {
    gcode
        .lines()
        .map(strip_comments)
        .filter(|line| !line.is_empty() && line != "%")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("G0 X1 ; rapid"), "G0 X1");
        assert_eq!(strip_comments("G1 (feed move) X2 F100"), "G1  X2 F100");
        assert_eq!(strip_comments("(header only)"), "");
        assert_eq!(strip_comments("G1 X1 (unclosed"), "G1 X1");
        assert_eq!(strip_comments("  M3 S1000  "), "M3 S1000");
    }

    #[test]
    fn test_program_lines() {
        let program = "%\n(Job: test)\nG21 ; mm\n\n   \nG90\nG0 X0 Y0\n%\n";
        assert_eq!(program_lines(program), vec!["G21", "G90", "G0 X0 Y0"]);
    }
}
