//! # Event Normalization
//!
//! Coerces [`RawEventRecord`]s into [`TypedEvent`]s.
//!
//! Date and time text are parsed leniently: forecast pages print dates as
//! `Saturday 1 June 2024`, feeds written by other tools use `2024-06-01`, and times
//! show up in both 12- and 24-hour form. Rows that cannot be turned into a
//! timestamp are reported as a [`NormalizeError`]; [`normalize_events`] drops them
//! and keeps going, so one bad row never costs the rest of the location.
//!
//! Some pages print dates without a year (`Saturday 1 June`). Those only parse when
//! the caller passes a reference date, normally the day the page was crawled. The
//! year comes from that date, rolling over to the next year when the result would
//! land more than half a year in the past.

use crate::{EventKind, RawEventRecord, TypedEvent};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use thiserror::Error;
use tracing::{debug, trace};

/// Row-level normalization failures. Both are recovered by skipping the row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Row has no date (even after carry-forward) or no time
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Date and time text did not parse as a timestamp
    #[error("unparseable date/time: {0:?}")]
    DateParse(String),
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d %Y",
];

/// Tried against `"<date> <reference year>"` when the date carries no year
const YEARLESS_FORMATS: &[&str] = &["%d %B %Y", "%B %d %Y"];

/// Year-less dates further than this behind the reference belong to the next year
const ROLLOVER_DAYS: i64 = 183;

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M:%S %p"];

const SUFFIX: &str = " m";

impl EventKind {
    /// Map a table label to its event kind. Unknown labels become [`EventKind::Other`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "Sunrise" => EventKind::Sunrise,
            "Sunset" => EventKind::Sunset,
            "Low Tide" => EventKind::LowTide,
            "High Tide" => EventKind::HighTide,
            _ => EventKind::Other,
        }
    }

    pub fn is_tide(self) -> bool {
        matches!(self, EventKind::LowTide | EventKind::HighTide)
    }
}

/// Normalize a single row.
///
/// The height is only kept for tide events, and an unparseable height is treated
/// as absent rather than failing the row. `reference` supplies the year for dates
/// printed without one.
pub fn normalize_event(
    record: &RawEventRecord,
    reference: Option<NaiveDate>,
) -> Result<TypedEvent, NormalizeError> {
    let date = non_blank(record.date.as_deref()).ok_or(NormalizeError::MissingField("date"))?;
    let time = non_blank(record.time.as_deref()).ok_or(NormalizeError::MissingField("time"))?;

    let timestamp = parse_timestamp(date, time, reference)?;
    let kind = EventKind::from_label(&record.label);
    let meters = if kind.is_tide() {
        parse_magnitude(record.magnitude_text.as_deref())
    } else {
        None
    };

    Ok(TypedEvent {
        timestamp,
        meters,
        kind,
    })
}

/// Normalize a location's rows, dropping malformed rows and [`EventKind::Other`]
/// events. Row order is preserved.
pub fn normalize_events(records: &[RawEventRecord], reference: Option<NaiveDate>) -> Vec<TypedEvent> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match normalize_event(record, reference) {
            Ok(event) if event.kind == EventKind::Other => {
                trace!(row = index, label = %record.label, "skipping unrecognized event");
                None
            }
            Ok(event) => Some(event),
            Err(error) => {
                debug!(row = index, %error, "dropping forecast row");
                None
            }
        })
        .collect()
}

/// Combine date and time text into a local timestamp.
///
/// A leading weekday is ignored, so a weekday that disagrees with the date does
/// not reject the row. Dates without a year need `reference`.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_forecast_lib::normalize::parse_timestamp;
///
/// let ts = parse_timestamp("Saturday 1 June 2024", "6:02 PM PDT", None).unwrap();
/// assert_eq!(ts.to_string(), "2024-06-01 18:02:00");
///
/// let crawled = NaiveDate::from_ymd_opt(2024, 5, 30);
/// let ts = parse_timestamp("Saturday 1 June", "6:02 AM", crawled).unwrap();
/// assert_eq!(ts.to_string(), "2024-06-01 06:02:00");
/// ```
pub fn parse_timestamp(
    date: &str,
    time: &str,
    reference: Option<NaiveDate>,
) -> Result<NaiveDateTime, NormalizeError> {
    let parse_error = || NormalizeError::DateParse(format!("{} {}", date.trim(), time.trim()));

    let date_text = clean_date(date);
    let time_text = clean_time(time);

    let day = parse_date(&date_text, reference).ok_or_else(parse_error)?;
    let clock = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&time_text, fmt).ok())
        .ok_or_else(parse_error)?;

    Ok(day.and_time(clock))
}

/// Parse a tide height such as `"1.23 m"`. Returns `None` for absent or
/// unparseable text.
pub fn parse_magnitude(text: Option<&str>) -> Option<f32> {
    let text = text?.trim();
    let number = text.strip_suffix(SUFFIX).unwrap_or(text).trim();
    number.parse::<f32>().ok().filter(|m| m.is_finite())
}

fn parse_date(text: &str, reference: Option<NaiveDate>) -> Option<NaiveDate> {
    if let Some(day) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(day);
    }

    let reference = reference?;
    let in_year = |year: i32| {
        let dated = format!("{} {}", text, year);
        YEARLESS_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&dated, fmt).ok())
    };

    match in_year(reference.year()) {
        Some(day) if reference - day > Duration::days(ROLLOVER_DAYS) => in_year(reference.year() + 1),
        Some(day) => Some(day),
        // 29 February outside a leap year
        None => in_year(reference.year() + 1),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Drop commas, a leading weekday and ordinal suffixes (`1st` → `1`), collapse
/// whitespace.
fn clean_date(date: &str) -> String {
    let cleaned = date.replace(',', " ");
    let mut tokens: Vec<&str> = cleaned.split_whitespace().map(strip_ordinal).collect();
    if tokens.len() > 1 && tokens[0].trim_end_matches('.').parse::<Weekday>().is_ok() {
        tokens.remove(0);
    }
    tokens.join(" ")
}

fn strip_ordinal(token: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = token.strip_suffix(suffix) {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits;
            }
        }
    }
    token
}

/// Split `6:02PM` into `6:02 PM` and drop a trailing timezone abbreviation.
fn clean_time(time: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    for token in time.split_whitespace() {
        let lower = token.to_ascii_lowercase();
        match lower.strip_suffix("am").or_else(|| lower.strip_suffix("pm")) {
            Some(clock) if clock.ends_with(|c: char| c.is_ascii_digit()) => {
                tokens.push(clock.to_string());
                tokens.push(lower[clock.len()..].to_string());
            }
            _ => tokens.push(token.to_string()),
        }
    }

    if let Some(last) = tokens.last() {
        let is_meridiem = matches!(last.to_ascii_lowercase().as_str(), "am" | "pm");
        if tokens.len() > 1 && !is_meridiem && last.chars().all(|c| c.is_ascii_alphabetic()) {
            tokens.pop();
        }
    }

    tokens.join(" ")
}
