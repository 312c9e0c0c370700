//! Calendar date helpers shared by the wizard and the storage backends.
//!
//! Every date the wizard compares is a plain calendar day. Inputs that carry
//! a time of day (ISO date-times, RFC 3339 timestamps) are normalized to
//! their date component before any comparison, so `2024-03-15T23:59:00` and
//! `2024-03-15` are the same day.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Error returned when a string is not a recognizable calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{input}'")]
pub struct DateParseError {
    pub input: String,
}

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses a calendar date, discarding any time-of-day component.
///
/// Accepted forms are `YYYY-MM-DD`, naive ISO date-times and RFC 3339
/// timestamps. An RFC 3339 timestamp keeps the date in its own offset.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use intake_core::dates::parse_calendar_date;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(parse_calendar_date("2024-03-15").unwrap(), day);
/// assert_eq!(parse_calendar_date("2024-03-15T18:45:00").unwrap(), day);
/// assert_eq!(parse_calendar_date("2024-03-15T23:30:00+02:00").unwrap(), day);
/// assert!(parse_calendar_date("2024-02-30").is_err());
/// ```
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| DateParseError {
            input: s.to_string(),
        })
}

/// Parses an optional date field. Blank input means "not provided".
pub fn parse_optional_date(s: &str) -> Result<Option<NaiveDate>, DateParseError> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    parse_calendar_date(s).map(Some)
}

/// Inclusive range check on calendar days.
///
/// ```
/// use chrono::NaiveDate;
/// use intake_core::dates::is_within;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
/// assert!(is_within(start, start, end));
/// assert!(is_within(end, start, end));
/// assert!(!is_within(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), start, end));
/// ```
pub fn is_within(
    date: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
) -> bool {
    start <= date && date <= end
}
