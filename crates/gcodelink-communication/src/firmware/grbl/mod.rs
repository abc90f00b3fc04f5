//! Grbl firmware support

pub mod error_decoder;
pub mod response_parser;
pub mod status_parser;

use super::common;
use super::registry::Matcher;

pub use status_parser::StatusParser;

/// Grbl matchers in evaluation order
///
/// `parser_state`, `parameters`, `version`, `option` and `echo` must run
/// before `feedback`, which claims every remaining bracketed line.
pub const MATCHERS: &[Matcher] = &[
    response_parser::status,
    common::ok,
    response_parser::error,
    response_parser::alarm,
    response_parser::parser_state,
    response_parser::parameters,
    response_parser::version,
    response_parser::option,
    response_parser::echo,
    response_parser::feedback,
    response_parser::settings,
    response_parser::startup,
];
