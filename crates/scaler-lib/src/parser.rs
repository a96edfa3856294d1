//! Log line parsing
//!
//! Extracts request signals from one line of free-text application log:
//! - an error marker (`ERROR`, `FATAL`, `Exception`, `Failed`, any case)
//! - a response time written as `response_time: <float>ms`
//! - a status code written as `status: <3 digits>`
//!
//! Markers match as plain substrings, so `Exceptional` counts as an error.

use crate::models::ParsedSignal;
use regex::Regex;
use std::sync::OnceLock;

const ERROR_MARKER_PATTERN: &str = r"(?i)ERROR|FATAL|Exception|Failed";
const RESPONSE_TIME_PATTERN: &str = r"response_time[:\s]+([0-9]+\.?[0-9]*)ms";
const STATUS_CODE_PATTERN: &str = r"status[:\s]+([0-9]{3})";

struct LinePatterns {
    error_marker: Regex,
    response_time: Regex,
    status_code: Regex,
}

static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();

fn patterns() -> &'static LinePatterns {
    PATTERNS.get_or_init(|| LinePatterns {
        error_marker: Regex::new(ERROR_MARKER_PATTERN).expect("Invalid error marker pattern"),
        response_time: Regex::new(RESPONSE_TIME_PATTERN)
            .expect("Invalid response time pattern"),
        status_code: Regex::new(STATUS_CODE_PATTERN).expect("Invalid status code pattern"),
    })
}

/// Parse one log line
///
/// Returns `None` for empty or whitespace-only lines; such lines are not
/// requests. Lines without a response time or status simply leave those
/// fields unset.
pub fn parse_line(line: &str) -> Option<ParsedSignal> {
    if line.chars().all(is_blank) {
        return None;
    }

    let patterns = patterns();

    Some(ParsedSignal {
        has_error_marker: patterns.error_marker.is_match(line),
        response_time_ms: capture(&patterns.response_time, line),
        status_code: capture(&patterns.status_code, line),
    })
}

/// Unicode whitespace plus the ASCII file/group/record/unit separators
fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Parse the first capture group of the leftmost match
fn capture<T: std::str::FromStr>(pattern: &Regex, line: &str) -> Option<T> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
