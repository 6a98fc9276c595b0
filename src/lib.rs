//! Batch catalog crawler for books.toscrape.com-style storefronts.
//!
//! One run walks the whole catalog: category discovery on the root page,
//! paginated listing traversal per category, per-product detail extraction
//! with image download, and one CSV dataset per category. Categories are
//! crawled concurrently and fail independently.

pub mod config;
pub mod crawler;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod parsing;

pub use config::CrawlerConfig;
pub use crawler::{CategoryOutcome, CrawlOrchestrator, CrawlSummary};
pub use domain::{CategoryRef, ProductRecord, Rating};
pub use error::{CategoryError, CrawlError, ExtractionError, FetchError};
