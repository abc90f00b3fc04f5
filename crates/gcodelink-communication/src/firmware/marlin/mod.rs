//! Marlin firmware support

pub mod response_parser;

use super::common;
use super::registry::Matcher;

/// Marlin matchers in evaluation order
///
/// `halted` precedes `common::error` so fatal errors surface as alarms, and
/// `action` precedes `feedback` since both start with `//`.
pub const MATCHERS: &[Matcher] = &[
    response_parser::ok,
    response_parser::halted,
    common::error,
    common::alarm,
    response_parser::startup,
    response_parser::echo,
    response_parser::action,
    response_parser::feedback,
    response_parser::position,
    response_parser::temperature,
];
