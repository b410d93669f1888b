//! Date and reading-time helpers shared by the loader and the pages.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const WORDS_PER_MINUTE: f64 = 180.0;
const MIN_READ_MINUTES: f64 = 3.0;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];

/// Parses the date forms accepted in front matter. Zoned values are
/// normalized to UTC; naive values are taken as UTC.
pub fn parse_post_date(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    // RFC 3339 with a space instead of `T`.
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt);
    }
    if let Some(date) = NAIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
    {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc2822(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
}

/// `DD Month YYYY`, e.g. `05 May 2024`. Unparseable input is returned as is.
pub fn format_display_date(input: &str) -> String {
    let trimmed = input.trim();
    // Keep the calendar day the author wrote, whatever its offset.
    let local = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc2822(trimmed)
                .map(|dt| dt.naive_local())
                .ok()
        })
        .or_else(|| parse_post_date(trimmed));

    match local {
        Some(dt) => dt.format("%d %B %Y").to_string(),
        None => input.to_string(),
    }
}

/// Reading time label for a body of text, never less than three minutes.
pub fn estimate_read(text: &str) -> String {
    let words = text.split_whitespace().count().max(1);
    let minutes = (words as f64 / WORDS_PER_MINUTE).round().max(MIN_READ_MINUTES);
    format!("{} minutes read", minutes as u64)
}
