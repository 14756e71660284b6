use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

const CANONICAL_FORMAT: &str = "%Y-%m-%d";

enum DatePattern {
    Rfc3339,
    Rfc2822,
    WithOffset(&'static str),
    DateTime(&'static str),
    Date(&'static str),
}

/// Tried in order; the first pattern that consumes the whole input wins.
const DATE_PATTERNS: &[DatePattern] = &[
    DatePattern::Rfc3339,
    DatePattern::WithOffset("%Y-%m-%dT%H:%M:%S%z"),
    DatePattern::WithOffset("%Y-%m-%dT%H:%M:%S%.f%z"),
    DatePattern::DateTime("%Y-%m-%dT%H:%M:%S"),
    DatePattern::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    DatePattern::DateTime("%Y-%m-%d %H:%M:%S"),
    DatePattern::Date("%Y-%m-%d"),
    DatePattern::Date("%B %d, %Y"),
    DatePattern::Date("%b %d, %Y"),
    DatePattern::Date("%d %B %Y"),
    DatePattern::Date("%d %b %Y"),
    DatePattern::Date("%m/%d/%Y"),
    DatePattern::Date("%Y/%m/%d"),
    DatePattern::Rfc2822,
];

static EMBEDDED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid date regex"));

/// Normalize a free-form date string into `YYYY-MM-DD`.
///
/// Dates carrying an offset keep the calendar day as written, they are not
/// converted to UTC. Returns `None` when nothing date-like can be recovered.
pub fn normalize_date(raw: &str) -> Option<String> {
    let input = raw.trim();
    if input.is_empty() {
        return None;
    }

    DATE_PATTERNS
        .iter()
        .find_map(|pattern| parse_with(pattern, input))
        .or_else(|| embedded_date(input))
        .map(|date| date.format(CANONICAL_FORMAT).to_string())
}

fn parse_with(pattern: &DatePattern, input: &str) -> Option<NaiveDate> {
    match pattern {
        DatePattern::Rfc3339 => DateTime::parse_from_rfc3339(input)
            .ok()
            .map(|dt| dt.date_naive()),
        DatePattern::Rfc2822 => DateTime::parse_from_rfc2822(input)
            .ok()
            .map(|dt| dt.date_naive()),
        DatePattern::WithOffset(fmt) => DateTime::parse_from_str(input, fmt)
            .ok()
            .map(|dt| dt.date_naive()),
        DatePattern::DateTime(fmt) => NaiveDateTime::parse_from_str(input, fmt)
            .ok()
            .map(|dt| dt.date()),
        DatePattern::Date(fmt) => NaiveDate::parse_from_str(input, fmt).ok(),
    }
}

fn embedded_date(input: &str) -> Option<NaiveDate> {
    EMBEDDED_DATE
        .find_iter(input)
        .find_map(|m| NaiveDate::parse_from_str(m.as_str(), CANONICAL_FORMAT).ok())
}
