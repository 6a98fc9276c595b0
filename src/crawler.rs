//! The crawl pipeline: pagination, product extraction, asset download and
//! run orchestration.

pub mod assets;
pub mod extractor;
pub mod orchestrator;
pub mod paginator;

pub use assets::AssetDownloader;
pub use extractor::ProductExtractor;
pub use orchestrator::{CategoryOutcome, CrawlOrchestrator, CrawlSummary};
pub use paginator::ListingPaginator;
