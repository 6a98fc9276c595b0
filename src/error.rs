//! Error types for every stage of the crawl pipeline.
//!
//! Each stage owns a small error enum; errors cross stage boundaries only
//! through explicit `#[from]`/`#[source]` conversions so the orchestrator can
//! apply its failure-isolation policy per stage.

use std::path::PathBuf;

use thiserror::Error;

/// Transport- and status-level failures from the page fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("fetch cancelled: {url}")]
    Cancelled { url: String },
}

impl FetchError {
    /// The HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Client errors (4xx) are deterministic and never retried; the paginator
    /// relies on 404 passing through untouched as its end-of-pages signal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Cancelled { .. } => false,
        }
    }
}

/// Failures while turning a product detail page into a record.
///
/// A record is all-or-nothing: any variant here discards the whole product.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("required field '{0}' not found on product page")]
    MissingField(&'static str),

    #[error("field '{field}' has malformed value '{value}'")]
    MalformedField { field: &'static str, value: String },

    #[error("failed to fetch product page")]
    Fetch(#[from] FetchError),

    #[error("failed to download product image")]
    Asset(#[from] AssetError),
}

impl ExtractionError {
    pub fn malformed(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedField {
            field,
            value: value.into(),
        }
    }
}

/// Failures while fetching or persisting a product image.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch image")]
    Fetch(#[source] FetchError),

    #[error("failed to write image to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while writing or reading a category dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset I/O failed")]
    Io(#[from] std::io::Error),

    #[error("dataset serialization failed")]
    Csv(#[from] csv::Error),
}

/// Why one category ended in `Failed` without touching its siblings.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("listing pagination failed")]
    Pagination(#[source] FetchError),

    #[error("{failed} products failed, exceeding the threshold of {threshold} (first error: {first_error})")]
    TooManyFailures {
        failed: u32,
        threshold: u32,
        first_error: String,
    },

    #[error("failed to write category dataset")]
    DatasetWrite(#[from] DatasetError),

    #[error("category crawl cancelled")]
    Cancelled,
}

/// Failures fatal to the whole run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to fetch catalog root")]
    RootFetch(#[source] FetchError),

    #[error("no categories discovered on the catalog root page")]
    NoCategories,
}
