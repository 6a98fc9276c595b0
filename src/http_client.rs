//! HTTP page fetcher.
//!
//! One shared client for listing pages, detail pages and image assets. All
//! fetches go through the same bounded pool (a semaphore sized by the
//! configured concurrency) and a rate limiter that keeps the crawl polite
//! toward the single origin it targets. Transport and status outcomes are
//! classified into [`FetchError`] here; nothing above this layer touches
//! `reqwest` errors directly.

use std::num::NonZeroU32;

use anyhow::{Context, Result};
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::FetchError;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Rate-limited, concurrency-bounded HTTP client for the crawl.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    fetch_pool: Semaphore,
    max_retries: u32,
}

impl HttpClient {
    /// Build a client from the crawler configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("max_requests_per_second must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            fetch_pool: Semaphore::new(config.concurrency),
            max_retries: config.max_retries,
        })
    }

    /// Fetch a URL once, returning the raw body bytes.
    ///
    /// Holds a pool permit for the whole request, including the body read, so
    /// at most `concurrency` requests are in flight at any time.
    pub async fn fetch(&self, url: &Url, token: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        if token.is_cancelled() {
            return Err(Self::cancelled(url));
        }

        let _permit = self
            .fetch_pool
            .acquire()
            .await
            .map_err(|_| Self::cancelled(url))?;

        tokio::select! {
            () = self.rate_limiter.until_ready() => {}
            () = token.cancelled() => return Err(Self::cancelled(url)),
        }

        tracing::debug!("fetching {url}");

        let response = tokio::select! {
            result = self.client.get(url.clone()).send() => {
                result.map_err(|e| Self::classify(url, e))?
            }
            () = token.cancelled() => return Err(Self::cancelled(url)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = tokio::select! {
            result = response.bytes() => result.map_err(|e| Self::classify(url, e))?,
            () = token.cancelled() => return Err(Self::cancelled(url)),
        };

        tracing::debug!("fetched {url} ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Fetch with bounded exponential-backoff retry.
    ///
    /// Only transport failures and 5xx responses are retried; 4xx responses
    /// come back immediately so callers can react to them (the paginator
    /// treats 404 as end-of-pages).
    pub async fn fetch_with_retry(
        &self,
        url: &Url,
        token: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch(url, token).await {
                Ok(body) => {
                    if attempt > 0 {
                        tracing::info!("fetched {url} after {} retries", attempt);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = RETRY_BASE_DELAY * 2_u32.pow(attempt);
                    attempt += 1;
                    tracing::warn!("fetch of {url} failed (attempt {attempt}), retrying in {delay:?}: {e}");
                    tokio::select! {
                        () = sleep(delay) => {}
                        () = token.cancelled() => return Err(Self::cancelled(url)),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn classify(url: &Url, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    fn cancelled(url: &Url) -> FetchError {
        FetchError::Cancelled {
            url: url.to_string(),
        }
    }
}
