//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-forecast.toml
//! file. The configuration is built once by the binary and passed down by parameter;
//! nothing in the library reads the environment.
//!
//! The four crawler options (`user_agent`, `log_level`, `feed_format`, `feed_uri`)
//! are handed to the crawler as-is. The summarizing pipeline takes no configuration
//! beyond the `parallel` switch.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "tide-forecast.toml";

/// Application configuration loaded from tide-forecast.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Crawler collaborator settings
    pub crawler: CrawlerConfig,
    /// Summarizing pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Settings for the forecast crawler
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Default log filter when RUST_LOG is unset (e.g. "info", "debug")
    pub log_level: String,
    /// Feed serialization format; only "jsonlines" is written
    pub feed_format: String,
    /// Where the crawler writes its feed and the summarizer reads it
    pub feed_uri: PathBuf,
    /// Index page listing every location's forecast page
    #[serde(default = "default_start_url")]
    pub start_url: String,
    /// Upper bound on in-flight page requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Settings for the summarizing pipeline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Process locations in parallel
    pub parallel: bool,
}

fn default_start_url() -> String {
    "https://www.tide-forecast.com/".to_string()
}

fn default_max_concurrent_requests() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig { parallel: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            crawler: CrawlerConfig {
                user_agent: concat!("tide-forecast/", env!("CARGO_PKG_VERSION")).to_string(),
                log_level: "info".to_string(),
                feed_format: "jsonlines".to_string(),
                feed_uri: PathBuf::from("tide_forecast.jl"),
                start_url: default_start_url(),
                max_concurrent_requests: default_max_concurrent_requests(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from tide-forecast.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(feed = %config.crawler.feed_uri.display(), "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {}", e);
                    warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "no config file at {}, using default configuration",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.crawler.log_level, "info");
        assert_eq!(config.crawler.feed_format, "jsonlines");
        assert_eq!(config.crawler.start_url, "https://www.tide-forecast.com/");
        assert!(config.pipeline.parallel);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [crawler]
            user_agent = "tide-bot"
            log_level = "debug"
            feed_format = "jsonlines"
            feed_uri = "/tmp/tides.jl"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.crawler.user_agent, "tide-bot");
        assert_eq!(parsed.crawler.feed_uri, PathBuf::from("/tmp/tides.jl"));
        assert_eq!(parsed.crawler.max_concurrent_requests, 8);
        assert_eq!(parsed.crawler.request_timeout_secs, 30);
        assert!(parsed.pipeline.parallel);
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.pipeline.parallel = false;
        config.crawler.user_agent = "custom".into();

        config.save(temp_file.path()).unwrap();
        assert_eq!(Config::load_from_path(temp_file.path()), config);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config, Config::default());
    }
}
