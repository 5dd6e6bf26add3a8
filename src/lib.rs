//! # Tide Forecast Core Library
//!
//! This library turns the raw, row-oriented tide tables scraped from per-location
//! forecast pages into a per-date summary that says which high and low tides fall
//! in daylight and which fall at night.
//!
//! ## Data Flow
//!
//! Each location is processed on its own, strictly in this order:
//! 1. **Extract** ([`extract`]): raw table rows → [`RawEventRecord`]s, with missing
//!    dates carried forward from the row above
//! 2. **Normalize** ([`normalize`]): [`RawEventRecord`] → [`TypedEvent`], dropping
//!    rows that lack a date/time or fail to parse
//! 3. **Aggregate** ([`aggregate`]): [`TypedEvent`]s → one [`DailyRecord`] per date
//! 4. **Classify** ([`classify`]): [`DailyRecord`] → [`ClassifiedDailyRecord`] using
//!    that date's sunrise/sunset window
//!
//! All stages are pure: they borrow their input and return a new collection. Locations
//! share nothing, so [`pipeline::process_all`] runs them in parallel.
//!
//! ## Wall-clock Time
//! Times are kept exactly as scraped (local wall-clock, no timezone conversion).
//! The table's timezone label rides along on the location for display only.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Module declarations
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod feed;
pub mod normalize;
pub mod pipeline;


/// One row of a location's forecast table, before any type coercion.
///
/// Field names on the wire follow the crawler's feed format (`meters`, `event`).
///
/// # Example
/// ```
/// use tide_forecast_lib::RawEventRecord;
///
/// let row = RawEventRecord {
///     date: None,
///     time: Some("09:15".into()),
///     magnitude_text: Some("0.42 m".into()),
///     label: "Low Tide".into(),
/// };
/// assert!(row.date.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Date text; absent rows inherit the nearest preceding date
    #[serde(default)]
    pub date: Option<String>,
    /// Time-of-day text
    #[serde(default)]
    pub time: Option<String>,
    /// Tide height text, usually with a `" m"` suffix
    #[serde(rename = "meters", default)]
    pub magnitude_text: Option<String>,
    /// Event label such as `"Sunrise"` or `"High Tide"`
    #[serde(rename = "event", default, deserialize_with = "null_as_empty")]
    pub label: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Kind of a forecast event, derived from the row label by exact match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Sunrise,
    Sunset,
    LowTide,
    HighTide,
    /// Moonrise, moon phases and anything else the table carries
    Other,
}

/// A normalized forecast event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedEvent {
    /// Local wall-clock timestamp as scraped
    pub timestamp: NaiveDateTime,
    /// Tide height in meters; only ever set for tide events
    pub meters: Option<f32>,
    pub kind: EventKind,
}

/// A single high or low tide within a day.
///
/// Serializes as `[time, meters]`, or `[time]` when the height is unknown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideEntry {
    pub time: NaiveTime,
    pub meters: Option<f32>,
}

impl Serialize for TideEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.meters.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.time)?;
        if let Some(meters) = &self.meters {
            seq.serialize_element(meters)?;
        }
        seq.end()
    }
}

/// Everything known about one calendar date at one location.
///
/// `sunrise_time` and `sunset_time` hold the earliest matching event of the date.
/// Tide lists keep the order the rows appeared in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub sunrise_time: Option<NaiveTime>,
    pub sunset_time: Option<NaiveTime>,
    pub low_tides: Vec<TideEntry>,
    pub high_tides: Vec<TideEntry>,
}

/// Day/night partition of a date's tides.
///
/// Each bucket is an order-preserving subsequence of the matching tide list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DayNightBuckets {
    pub day_high_tides: Vec<TideEntry>,
    pub day_low_tides: Vec<TideEntry>,
    pub night_high_tides: Vec<TideEntry>,
    pub night_low_tides: Vec<TideEntry>,
}

/// A [`DailyRecord`] plus its day/night buckets.
///
/// `buckets` is `None` when the date lacks a sunrise or a sunset, in which case
/// the bucket fields are left out of the serialized record entirely.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassifiedDailyRecord {
    #[serde(flatten)]
    pub record: DailyRecord,
    #[serde(flatten)]
    pub buckets: Option<DayNightBuckets>,
}

impl ClassifiedDailyRecord {
    /// True when the date had both a sunrise and a sunset to classify against
    pub fn is_classified(&self) -> bool {
        self.buckets.is_some()
    }
}

/// A forecast page discovered on the index page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub url: String,
    pub title: String,
}

/// One location's scraped forecast, as written to the JSON-lines feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Timezone label printed on the forecast table
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub forecast: Vec<RawEventRecord>,
    /// Day the page was crawled; supplies the year for dates printed without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawled_on: Option<NaiveDate>,
}

/// Terminal pipeline output for one location.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationSummary {
    pub url: String,
    pub title: String,
    pub timezone: Option<String>,
    pub days: Vec<ClassifiedDailyRecord>,
}
