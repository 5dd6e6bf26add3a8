//! # Per-location Pipeline
//!
//! Runs extract → normalize → aggregate → classify over one location's batch, and
//! drives that pass across many locations.
//!
//! Locations are independent, so [`process_all`] hands them to rayon and collects
//! the summaries back in input order. A single location's stages always run
//! together on one thread; nothing is shared between locations.
//!
//! Raw batches come from a [`ForecastSource`]: anything that can list locations
//! and hand back the finished rows for one of them. The pipeline never fetches
//! anything itself.

use crate::{
    aggregate, classify, extract, normalize, ForecastItem, Location, LocationSummary,
};
use rayon::prelude::*;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Pull-based provider of raw forecast batches.
pub trait ForecastSource {
    type Error: Display;

    /// Locations this source can provide
    fn locations(&self) -> Vec<Location>;

    /// The complete row batch for the location at `index` in [`Self::locations`]
    fn batch(&self, index: usize, location: &Location) -> Result<ForecastItem, Self::Error>;
}

/// Run the four stages over one location's batch.
///
/// An empty or entirely malformed batch yields a summary with no days.
pub fn process_location(item: &ForecastItem) -> LocationSummary {
    let records = extract::carry_forward_dates(&item.forecast);
    let events = normalize::normalize_events(&records, item.crawled_on);
    let daily = aggregate::aggregate_days(&events);
    let days = classify::classify_days(&daily);

    debug!(
        url = %item.url,
        rows = item.forecast.len(),
        events = events.len(),
        days = days.len(),
        "processed location"
    );

    LocationSummary {
        url: item.url.clone(),
        title: item.title.clone(),
        timezone: item.timezone.clone(),
        days,
    }
}

/// Process every location, optionally in parallel. Output order matches input order.
pub fn process_all(items: &[ForecastItem], parallel: bool) -> Vec<LocationSummary> {
    let summaries: Vec<LocationSummary> = if parallel {
        items.par_iter().map(process_location).collect()
    } else {
        items.iter().map(process_location).collect()
    };

    info!(locations = summaries.len(), "summarized forecast");
    summaries
}

/// Pull every location's batch from `source` and summarize it.
///
/// A location whose batch cannot be obtained is logged and left out; the others
/// are unaffected.
pub fn summarize_source<S>(source: &S, parallel: bool) -> Vec<LocationSummary>
where
    S: ForecastSource + Sync,
{
    let fetch = |(index, location): (usize, &Location)| match source.batch(index, location) {
        Ok(item) => Some(process_location(&item)),
        Err(error) => {
            warn!(url = %location.url, %error, "skipping location");
            None
        }
    };

    let locations = source.locations();
    let summaries: Vec<LocationSummary> = if parallel {
        locations.par_iter().enumerate().filter_map(fetch).collect()
    } else {
        locations.iter().enumerate().filter_map(fetch).collect()
    };

    info!(
        locations = locations.len(),
        summarized = summaries.len(),
        "summarized forecast source"
    );
    summaries
}
