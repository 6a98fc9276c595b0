//! Crawler configuration.
//!
//! Loaded from an optional JSON file (`crawler.json`, overridable through the
//! `CRAWLER_CONFIG` environment variable). Every field has a default so a
//! missing or partial file still yields a runnable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default values, shared between `Default` and the serde field defaults.
pub mod defaults {
    pub const BASE_URL: &str = "https://books.toscrape.com/";
    pub const CONCURRENCY: usize = 8;
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 8;
    pub const MAX_RETRIES: u32 = 3;
    pub const MAX_CATEGORY_FAILURES: u32 = 5;
    pub const OUTPUT_ROOT: &str = ".";
    pub const USER_AGENT: &str = concat!("bookscrape/", env!("CARGO_PKG_VERSION"));
    pub const LOG_LEVEL: &str = "info";
}

/// Complete crawler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Catalog root to crawl.
    pub base_url: String,

    /// Maximum simultaneous fetches (pages and assets share this pool).
    pub concurrency: usize,

    /// Per-fetch deadline in seconds.
    pub request_timeout_seconds: u64,

    /// Polite request-rate ceiling against the origin.
    pub max_requests_per_second: u32,

    /// Retry attempts for transport/5xx failures.
    pub max_retries: u32,

    /// Product failures tolerated before a category is abandoned.
    pub max_category_failures: u32,

    /// Base directory for `data/` and `pictures/`.
    pub output_root: PathBuf,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Base log level ("error" .. "trace"); `RUST_LOG` overrides it.
    pub log_level: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            concurrency: defaults::CONCURRENCY,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            max_retries: defaults::MAX_RETRIES,
            max_category_failures: defaults::MAX_CATEGORY_FAILURES,
            output_root: PathBuf::from(defaults::OUTPUT_ROOT),
            user_agent: defaults::USER_AGENT.to_string(),
            log_level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

impl CrawlerConfig {
    /// Load configuration from the conventional location.
    ///
    /// `CRAWLER_CONFIG` names an explicit file; otherwise `crawler.json` in
    /// the working directory is used when present, and defaults otherwise.
    pub fn load() -> Result<Self> {
        match std::env::var_os("CRAWLER_CONFIG") {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                let conventional = Path::new("crawler.json");
                if conventional.exists() {
                    Self::load_from(conventional)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a crawl.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.concurrency > 0, "concurrency must be greater than 0");
        anyhow::ensure!(
            self.max_requests_per_second > 0,
            "max_requests_per_second must be greater than 0"
        );
        anyhow::ensure!(
            self.request_timeout_seconds > 0,
            "request_timeout_seconds must be greater than 0"
        );
        self.base_url()?;
        Ok(())
    }

    /// The catalog root as a parsed URL.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .with_context(|| format!("base_url '{}' is not a valid URL", self.base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
