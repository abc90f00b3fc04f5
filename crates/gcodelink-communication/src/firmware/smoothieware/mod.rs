//! Smoothieware firmware support

pub mod response_parser;

use super::common;
use super::grbl::response_parser as grbl;
use super::registry::Matcher;

/// Smoothieware matchers in evaluation order
pub const MATCHERS: &[Matcher] = &[
    grbl::status,
    common::ok,
    grbl::error,
    grbl::alarm,
    response_parser::version,
    grbl::parser_state,
    grbl::parameters,
    grbl::version,
    grbl::option,
    grbl::echo,
    grbl::feedback,
    grbl::settings,
    response_parser::startup,
];
