//! # Day/Night Classification
//!
//! Splits each date's tides into daylight and night buckets. A tide is daytime
//! only when `sunrise < time < sunset`; a tide exactly at sunrise or sunset counts
//! as night.

use crate::{ClassifiedDailyRecord, DailyRecord, DayNightBuckets, TideEntry};
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::warn;

/// The date lacks a sunrise or sunset, so there is no daylight window.
///
/// Recovered by [`classify_days`]: the record is emitted without buckets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no daylight window for {date}: sunrise {sunrise:?}, sunset {sunset:?}")]
pub struct UnboundedDay {
    pub date: NaiveDate,
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
}

/// Strict interval test, both ends exclusive.
pub fn is_daytime(time: NaiveTime, sunrise: NaiveTime, sunset: NaiveTime) -> bool {
    sunrise < time && time < sunset
}

/// Partition one date's tides against its sunrise/sunset window.
pub fn classify_day(record: &DailyRecord) -> Result<DayNightBuckets, UnboundedDay> {
    let (Some(sunrise), Some(sunset)) = (record.sunrise_time, record.sunset_time) else {
        return Err(UnboundedDay {
            date: record.date,
            sunrise: record.sunrise_time,
            sunset: record.sunset_time,
        });
    };

    let (day_high_tides, night_high_tides) = split(&record.high_tides, sunrise, sunset);
    let (day_low_tides, night_low_tides) = split(&record.low_tides, sunrise, sunset);

    Ok(DayNightBuckets {
        day_high_tides,
        day_low_tides,
        night_high_tides,
        night_low_tides,
    })
}

/// Classify every record, passing unbounded dates through unclassified.
pub fn classify_days(records: &[DailyRecord]) -> Vec<ClassifiedDailyRecord> {
    records
        .iter()
        .map(|record| {
            let buckets = classify_day(record)
                .map_err(|error| warn!(%error, "leaving date unclassified"))
                .ok();
            ClassifiedDailyRecord {
                record: record.clone(),
                buckets,
            }
        })
        .collect()
}

fn split(tides: &[TideEntry], sunrise: NaiveTime, sunset: NaiveTime) -> (Vec<TideEntry>, Vec<TideEntry>) {
    tides
        .iter()
        .copied()
        .partition(|tide| is_daytime(tide.time, sunrise, sunset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(time: &str) -> NaiveTime {
        NaiveTime::parse_from_str(time, "%H:%M").unwrap()
    }

    fn tide(time: &str, meters: f32) -> TideEntry {
        TideEntry {
            time: hm(time),
            meters: Some(meters),
        }
    }

    fn day(sunrise: Option<&str>, sunset: Option<&str>) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            sunrise_time: sunrise.map(hm),
            sunset_time: sunset.map(hm),
            low_tides: vec![tide("02:10", 0.2), tide("09:15", 0.42), tide("21:00", 0.3)],
            high_tides: vec![tide("06:02", 1.5), tide("15:40", 1.98), tide("20:31", 1.7)],
        }
    }

    #[test]
    fn test_boundaries_are_night() {
        assert!(!is_daytime(hm("06:02"), hm("06:02"), hm("20:31")));
        assert!(!is_daytime(hm("20:31"), hm("06:02"), hm("20:31")));
        assert!(is_daytime(hm("06:03"), hm("06:02"), hm("20:31")));
    }

    #[test]
    fn test_classify_day_partitions_in_order() {
        let buckets = classify_day(&day(Some("06:02"), Some("20:31"))).unwrap();

        assert_eq!(buckets.day_low_tides, vec![tide("09:15", 0.42)]);
        assert_eq!(buckets.night_low_tides, vec![tide("02:10", 0.2), tide("21:00", 0.3)]);
        assert_eq!(buckets.day_high_tides, vec![tide("15:40", 1.98)]);
        assert_eq!(buckets.night_high_tides, vec![tide("06:02", 1.5), tide("20:31", 1.7)]);
    }

    #[test]
    fn test_partition_is_complete() {
        let record = day(Some("06:02"), Some("20:31"));
        let buckets = classify_day(&record).unwrap();

        assert_eq!(
            buckets.day_high_tides.len() + buckets.night_high_tides.len(),
            record.high_tides.len()
        );
        assert_eq!(
            buckets.day_low_tides.len() + buckets.night_low_tides.len(),
            record.low_tides.len()
        );
    }

    #[test]
    fn test_missing_boundary_is_unbounded() {
        let err = classify_day(&day(None, Some("20:31"))).unwrap_err();
        assert_eq!(err.sunrise, None);
        assert_eq!(err.sunset, Some(hm("20:31")));
        assert!(classify_day(&day(Some("06:02"), None)).is_err());
    }

    #[test]
    fn test_classify_days_passes_unbounded_through() {
        let records = vec![day(Some("06:02"), Some("20:31")), day(None, None)];
        let classified = classify_days(&records);

        assert_eq!(classified.len(), 2);
        assert!(classified[0].is_classified());
        assert!(!classified[1].is_classified());
        assert_eq!(classified[1].record, records[1]);
    }
}
