//! # JSON-lines Forecast Feed
//!
//! The crawler writes one [`ForecastItem`] per line; the pipeline reads them back
//! through [`FeedSource`]. A line that fails to decode only loses that location.

use crate::pipeline::ForecastSource;
use crate::{ForecastItem, Location};
use std::{fs, io, path::Path};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while reading or writing the feed file.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Feed file could not be read or written
    #[error("feed IO: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded
    #[error("feed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The feed holds no batch for the requested location
    #[error("no forecast for {0}")]
    UnknownLocation(String),
}

/// Decode a JSON-lines feed. Blank lines are ignored and malformed lines are
/// logged and skipped.
pub fn parse_feed(text: &str) -> Vec<ForecastItem> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(number, line)| match serde_json::from_str::<ForecastItem>(line) {
            Ok(item) => Some(item),
            Err(error) => {
                warn!(line = number + 1, %error, "skipping malformed feed record");
                None
            }
        })
        .collect()
}

/// Read and decode the feed at `path`.
pub fn load_feed<P: AsRef<Path>>(path: P) -> Result<Vec<ForecastItem>, FeedError> {
    let text = fs::read_to_string(&path)?;
    let items = parse_feed(&text);
    info!(path = %path.as_ref().display(), locations = items.len(), "loaded forecast feed");
    Ok(items)
}

/// Write `items` to `path` as JSON lines, replacing any existing file.
pub fn write_feed<P: AsRef<Path>>(path: P, items: &[ForecastItem]) -> Result<(), FeedError> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    fs::write(&path, out)?;
    info!(path = %path.as_ref().display(), locations = items.len(), "wrote forecast feed");
    Ok(())
}

/// A [`ForecastSource`] backed by an already-loaded feed.
#[derive(Clone, Debug, Default)]
pub struct FeedSource {
    items: Vec<ForecastItem>,
}

impl FeedSource {
    pub fn new(items: Vec<ForecastItem>) -> Self {
        FeedSource { items }
    }

    /// Load the feed file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        Ok(Self::new(load_feed(path)?))
    }
}

impl ForecastSource for FeedSource {
    type Error = FeedError;

    fn locations(&self) -> Vec<Location> {
        self.items
            .iter()
            .map(|item| Location {
                url: item.url.clone(),
                title: item.title.clone(),
            })
            .collect()
    }

    /// Batches are looked up by position, so repeated URLs keep their own rows.
    fn batch(&self, index: usize, location: &Location) -> Result<ForecastItem, FeedError> {
        self.items
            .get(index)
            .filter(|item| item.url == location.url)
            .cloned()
            .ok_or_else(|| FeedError::UnknownLocation(location.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::summarize_source;
    use crate::RawEventRecord;
    use tempfile::NamedTempFile;

    const FEED: &str = r#"{"url":"https://example.test/a","title":"Half Moon Bay","timezone":"PDT","forecast":[{"date":"2024-06-01","time":"06:02","meters":null,"event":"Sunrise"},{"time":"09:15","meters":"0.42 m","event":"Low Tide"}]}

{"url": "https://example.test/broken", "forecast": [
{"url":"https://example.test/b","title":null,"timezone":null,"forecast":[{"date":null,"time":null,"event":null}]}
"#;

    #[test]
    fn test_parse_feed_skips_bad_lines() {
        let items = parse_feed(FEED);
        assert_eq!(items.len(), 2);

        let a = &items[0];
        assert_eq!(a.title, "Half Moon Bay");
        assert_eq!(a.forecast.len(), 2);
        assert_eq!(a.forecast[1].date, None);
        assert_eq!(a.forecast[1].magnitude_text.as_deref(), Some("0.42 m"));
        assert_eq!(a.forecast[1].label, "Low Tide");

        let b = &items[1];
        assert_eq!(b.title, "");
        assert_eq!(b.timezone, None);
        assert_eq!(b.forecast[0], RawEventRecord::default());
    }

    #[test]
    fn test_feed_file_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let items = parse_feed(FEED);

        write_feed(temp_file.path(), &items).unwrap();
        let loaded = load_feed(temp_file.path()).unwrap();

        assert_eq!(loaded, items);
    }

    #[test]
    fn test_load_missing_feed_is_io_error() {
        let err = load_feed("/nonexistent/feed.jl").unwrap_err();
        assert!(matches!(err, FeedError::Io(_)));
    }

    #[test]
    fn test_feed_source_lookup() {
        let source = FeedSource::new(parse_feed(FEED));
        let locations = source.locations();
        assert_eq!(locations.len(), 2);

        let batch = source.batch(0, &locations[0]).unwrap();
        assert_eq!(batch.url, "https://example.test/a");

        let missing = Location {
            url: "https://example.test/zzz".into(),
            title: String::new(),
        };
        assert!(matches!(
            source.batch(0, &missing),
            Err(FeedError::UnknownLocation(_))
        ));
        assert!(matches!(
            source.batch(7, &locations[0]),
            Err(FeedError::UnknownLocation(_))
        ));
    }

    #[test]
    fn test_repeated_url_keeps_each_batch() {
        let feed = concat!(
            r#"{"url":"https://example.test/a","title":"Morning","forecast":[{"date":"2024-06-01","time":"06:02","event":"Sunrise"}]}"#,
            "\n",
            r#"{"url":"https://example.test/a","title":"Evening","forecast":[{"date":"2024-06-02","time":"20:31","event":"Sunset"}]}"#,
            "\n",
        );
        let source = FeedSource::new(parse_feed(feed));

        let summaries = summarize_source(&source, false);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title, "Morning");
        assert_eq!(summaries[1].title, "Evening");
        assert_eq!(summaries[0].days[0].record.date.to_string(), "2024-06-01");
        assert_eq!(summaries[1].days[0].record.date.to_string(), "2024-06-02");
    }
}
