//! # Tide Forecast Application Entry Point
//!
//! Loads the configuration, refreshes the forecast feed with the crawler (unless
//! `--offline` is given), summarizes every location and prints one JSON line per
//! location on stdout. Logs go to stderr.
//!
//! ```text
//! tide-forecast [--config PATH] [--offline]
//! ```

use anyhow::Context;
use std::env;
use std::io::{self, Write};
use tide_forecast_lib::{config::Config, crawler, feed::FeedSource, pipeline};
use tracing_subscriber::EnvFilter;

/// Command line options, scanned by hand like the rest of the binary's flags
struct Args {
    config: Option<String>,
    offline: bool,
}

fn parse_args() -> Args {
    let mut args = env::args().skip(1);
    let mut parsed = Args {
        config: None,
        offline: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--offline" => parsed.offline = true,
            "--config" => parsed.config = args.next(),
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
    }
    parsed
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = parse_args();

    // Configuration is read once and handed down explicitly
    let config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.crawler.log_level)),
        )
        .init();

    if !args.offline {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(crawler::crawl_to_feed(&config.crawler))
            .context("crawling forecast site")?;
    }

    let source = FeedSource::open(&config.crawler.feed_uri).with_context(|| {
        format!(
            "reading forecast feed {}",
            config.crawler.feed_uri.display()
        )
    })?;
    let summaries = pipeline::summarize_source(&source, config.pipeline.parallel);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for summary in &summaries {
        serde_json::to_writer(&mut out, summary)?;
        writeln!(out)?;
    }

    Ok(())
}
