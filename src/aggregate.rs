//! # Daily Aggregation
//!
//! Groups a location's [`TypedEvent`]s by calendar date and reduces each group to a
//! [`DailyRecord`] in a single pass.
//!
//! - Dates come out in the order they were first seen.
//! - Sunrise and sunset keep the earliest time of the date. Overlapping table
//!   sections can repeat a sun event, and the earliest one wins.
//! - Tides keep row order.

use crate::{DailyRecord, EventKind, TideEntry, TypedEvent};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use tracing::debug;

impl DailyRecord {
    /// A date with no events yet
    pub fn empty(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            sunrise_time: None,
            sunset_time: None,
            low_tides: Vec::new(),
            high_tides: Vec::new(),
        }
    }
}

/// Bucket events by date and reduce each bucket to a [`DailyRecord`].
///
/// A date without a sunrise or sunset still produces a record, with that field
/// left as `None`.
pub fn aggregate_days(events: &[TypedEvent]) -> Vec<DailyRecord> {
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut days: Vec<DailyRecord> = Vec::new();

    for event in events {
        let date = event.timestamp.date();
        let time = event.timestamp.time();

        let slot = *index.entry(date).or_insert_with(|| {
            days.push(DailyRecord::empty(date));
            days.len() - 1
        });
        let day = &mut days[slot];

        match event.kind {
            EventKind::Sunrise => day.sunrise_time = Some(earliest(day.sunrise_time, time)),
            EventKind::Sunset => day.sunset_time = Some(earliest(day.sunset_time, time)),
            EventKind::LowTide => day.low_tides.push(TideEntry {
                time,
                meters: event.meters,
            }),
            EventKind::HighTide => day.high_tides.push(TideEntry {
                time,
                meters: event.meters,
            }),
            EventKind::Other => {}
        }
    }

    let days = dedup_days(days);
    debug!(events = events.len(), days = days.len(), "aggregated events by date");
    days
}

/// Collapse records that are identical field for field, keeping the first.
/// Duplicates need not be adjacent.
pub fn dedup_days(days: Vec<DailyRecord>) -> Vec<DailyRecord> {
    let mut kept: Vec<DailyRecord> = Vec::with_capacity(days.len());
    for day in days {
        if !kept.contains(&day) {
            kept.push(day);
        }
    }
    kept
}

fn earliest(current: Option<NaiveTime>, candidate: NaiveTime) -> NaiveTime {
    current.map_or(candidate, |time| time.min(candidate))
}
