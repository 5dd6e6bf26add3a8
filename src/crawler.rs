//! # Forecast Site Crawler
//!
//! Produces the raw per-location batches that the pipeline consumes. This is the
//! only module that touches the network:
//!
//! 1. **Discover**: fetch the index page and collect every location link from its
//!    `table.list_table`
//! 2. **Fetch**: download each location page concurrently (bounded by
//!    `max_concurrent_requests`)
//! 3. **Extract**: run [`extract::parse_forecast_table`] on each page
//! 4. **Feed**: write the batches to `feed_uri` as JSON lines
//!
//! A location page that fails to download is logged and left out of the feed; it
//! never aborts the crawl.

use crate::config::CrawlerConfig;
use crate::extract::{self, cell_text, selector};
use crate::feed::{self, FeedError};
use crate::{ForecastItem, Location};
use chrono::Local;
use reqwest::Url;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that can occur while crawling the forecast site.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Start URL is not a valid absolute URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configured feed format is not one the crawler can write
    #[error("unsupported feed format: {0}")]
    UnsupportedFormat(String),

    /// Writing the feed failed
    #[error(transparent)]
    Feed(#[from] FeedError),
}

const FEED_FORMATS: &[&str] = &["jsonlines", "jsonl", "jl"];

/// Output of one page fetch: discovery index, result, and the location it was for
type FetchTask = (usize, Result<ForecastItem, CrawlError>, Location);

/// Collect location links from the index page.
///
/// Each `table.list_table td` holding an anchor contributes one location; relative
/// links are resolved against `base`.
pub fn parse_location_links(html: &str, base: &Url) -> Vec<Location> {
    let doc = Html::parse_document(html);
    let cells = selector("table.list_table td");
    let anchor = selector("a");

    doc.select(&cells)
        .filter_map(|cell| {
            let link = cell.select(&anchor).next()?;
            let href = link.value().attr("href")?;
            let url = base.join(href).ok()?;
            Some(Location {
                url: url.to_string(),
                title: cell_text(link).unwrap_or_default(),
            })
        })
        .collect()
}

/// HTTP crawler for the forecast site.
#[derive(Clone, Debug)]
pub struct Crawler {
    client: reqwest::Client,
    start_url: Url,
    max_concurrent: usize,
}

impl Crawler {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let start_url = Url::parse(&config.start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", config.start_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Crawler {
            client,
            start_url,
            max_concurrent: config.max_concurrent_requests.max(1),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetch the index page and list every location it links to.
    pub async fn discover(&self) -> Result<Vec<Location>, CrawlError> {
        let html = self.get_text(self.start_url.as_str()).await?;
        let locations = parse_location_links(&html, &self.start_url);
        info!(count = locations.len(), "discovered forecast locations");
        Ok(locations)
    }

    /// Download one location page and extract its forecast rows.
    pub async fn fetch_location(&self, location: &Location) -> Result<ForecastItem, CrawlError> {
        let html = self.get_text(&location.url).await?;
        let table = extract::parse_forecast_table(&html);
        debug!(url = %location.url, rows = table.records.len(), "fetched forecast page");

        Ok(ForecastItem {
            url: location.url.clone(),
            title: location.title.clone(),
            timezone: table.timezone,
            forecast: table.records,
            crawled_on: Some(Local::now().date_naive()),
        })
    }

    /// Discover and fetch every location. Batches come back in discovery order.
    pub async fn crawl(&self) -> Result<Vec<ForecastItem>, CrawlError> {
        let locations = self.discover().await?;
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, location) in locations.into_iter().enumerate() {
            let crawler = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = crawler.fetch_location(&location).await;
                (index, result, location)
            });
        }

        Ok(collect_fetched(tasks).await)
    }
}

/// Drain finished fetch tasks back into discovery order.
///
/// Pages that failed to download and tasks that panicked are logged and left out.
async fn collect_fetched(mut tasks: JoinSet<FetchTask>) -> Vec<ForecastItem> {
    let mut fetched = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(item), _)) => fetched.push((index, item)),
            Ok((_, Err(error), location)) => {
                warn!(url = %location.url, %error, "skipping location page")
            }
            Err(error) => warn!(%error, "location fetch task failed"),
        }
    }

    fetched.sort_by_key(|(index, _)| *index);
    fetched.into_iter().map(|(_, item)| item).collect()
}

/// Crawl the site and write the feed configured in `config`.
///
/// Returns the batches that were written.
pub async fn crawl_to_feed(config: &CrawlerConfig) -> Result<Vec<ForecastItem>, CrawlError> {
    if !FEED_FORMATS.contains(&config.feed_format.as_str()) {
        return Err(CrawlError::UnsupportedFormat(config.feed_format.clone()));
    }

    let crawler = Crawler::new(config)?;
    let items = crawler.crawl().await?;
    feed::write_feed(&config.feed_uri, &items)?;
    Ok(items)
}
