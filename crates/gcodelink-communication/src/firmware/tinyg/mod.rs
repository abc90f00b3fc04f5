//! TinyG firmware support

pub mod response_parser;

use super::common;
use super::registry::Matcher;

/// TinyG matchers in evaluation order
pub const MATCHERS: &[Matcher] = &[
    response_parser::json_report,
    common::ok,
    common::error,
    common::alarm,
];
