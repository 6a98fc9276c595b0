//! End-to-end crawl coordination.
//!
//! The orchestrator is the only component that knows the full pipeline
//! shape: root page → categories → listing pages → product links → product
//! records → per-category dataset. Categories run as independent tasks;
//! a category that fails never disturbs its siblings. Within a category,
//! extraction tasks are dispatched as soon as the paginator yields their
//! URLs, so pagination and extraction of earlier pages overlap.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::crawler::assets::AssetDownloader;
use crate::crawler::extractor::ProductExtractor;
use crate::crawler::paginator::ListingPaginator;
use crate::dataset;
use crate::domain::{CategoryRef, ProductRecord};
use crate::error::{CategoryError, CrawlError, DatasetError, ExtractionError};
use crate::http_client::HttpClient;
use crate::parsing::{CategoryParser, Document, ListingPageParser, ProductPageParser};

/// How one category ended.
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: String,
    pub slug: String,
    pub products_written: usize,
    pub products_failed: u32,
    /// First error for a failed category; `None` means the dataset was written.
    pub error: Option<String>,
}

impl CategoryOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    fn failed(category: &CategoryRef, products_failed: u32, error: &CategoryError) -> Self {
        Self {
            category: category.name.clone(),
            slug: category.slug(),
            products_written: 0,
            products_failed,
            error: Some(error.to_string()),
        }
    }
}

/// Per-category results of one complete run.
#[derive(Debug)]
pub struct CrawlSummary {
    pub categories: Vec<CategoryOutcome>,
}

impl CrawlSummary {
    pub fn all_succeeded(&self) -> bool {
        self.categories.iter().all(CategoryOutcome::succeeded)
    }

    /// Emit the per-category report through the log.
    pub fn log_report(&self) {
        let succeeded = self.categories.iter().filter(|c| c.succeeded()).count();
        info!(
            "crawl finished: {}/{} categories succeeded",
            succeeded,
            self.categories.len()
        );
        for outcome in &self.categories {
            match &outcome.error {
                None => info!(
                    "  {}: {} products written, {} failed",
                    outcome.category, outcome.products_written, outcome.products_failed
                ),
                Some(e) => error!(
                    "  {}: FAILED after {} product failures: {}",
                    outcome.category, outcome.products_failed, e
                ),
            }
        }
    }
}

/// Shared dependencies handed to each category task.
struct CategoryContext {
    http: Arc<HttpClient>,
    listing_parser: Arc<ListingPageParser>,
    extractor: Arc<ProductExtractor>,
    max_category_failures: u32,
    output_root: PathBuf,
}

/// Coordinates one complete crawl run.
pub struct CrawlOrchestrator {
    http: Arc<HttpClient>,
    category_parser: CategoryParser,
    context: Arc<CategoryContext>,
    base_url: Url,
    token: CancellationToken,
}

impl CrawlOrchestrator {
    pub fn new(config: CrawlerConfig, token: CancellationToken) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;

        let http = Arc::new(HttpClient::new(&config)?);
        let extractor = Arc::new(ProductExtractor::new(
            http.clone(),
            ProductPageParser::new()?,
            AssetDownloader::new(http.clone(), &config.output_root),
        ));

        let context = Arc::new(CategoryContext {
            http: http.clone(),
            listing_parser: Arc::new(ListingPageParser::new()?),
            extractor,
            max_category_failures: config.max_category_failures,
            output_root: config.output_root.clone(),
        });

        Ok(Self {
            http,
            category_parser: CategoryParser::new()?,
            context,
            base_url,
            token,
        })
    }

    /// Run the crawl to completion and report per-category outcomes.
    ///
    /// Root discovery failure is fatal to the run; everything downstream is
    /// isolated per category.
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        info!("starting crawl of {}", self.base_url);

        let body = self
            .http
            .fetch_with_retry(&self.base_url, &self.token)
            .await
            .map_err(CrawlError::RootFetch)?;

        let categories = {
            let doc = Document::parse(&body);
            self.category_parser.discover(&doc, &self.base_url)
        };
        if categories.is_empty() {
            return Err(CrawlError::NoCategories);
        }
        info!("discovered {} categories", categories.len());

        let mut tasks: JoinSet<(usize, CategoryOutcome)> = JoinSet::new();
        for (index, category) in categories.into_iter().enumerate() {
            let context = self.context.clone();
            let token = self.token.clone();
            tasks.spawn(async move {
                let outcome = crawl_category(context, &category, token).await;
                (index, outcome)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(indexed) => outcomes.push(indexed),
                Err(e) => error!("category task aborted unexpectedly: {e}"),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);

        Ok(CrawlSummary {
            categories: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        })
    }
}

/// Crawl one category: paginate, extract, write.
async fn crawl_category(
    ctx: Arc<CategoryContext>,
    category: &CategoryRef,
    token: CancellationToken,
) -> CategoryOutcome {
    info!("crawling category '{}'", category.name);

    let mut paginator = ListingPaginator::new(
        ctx.http.clone(),
        ctx.listing_parser.clone(),
        category.listing_url.clone(),
    );
    let mut extractions: JoinSet<Result<ProductRecord, ExtractionError>> = JoinSet::new();

    // Paginating: dispatch each product URL as soon as its page is parsed.
    loop {
        if token.is_cancelled() {
            extractions.abort_all();
            return CategoryOutcome::failed(category, 0, &CategoryError::Cancelled);
        }
        match paginator.next_page(&token).await {
            Ok(Some(urls)) => {
                for url in urls {
                    let extractor = ctx.extractor.clone();
                    let category_name = category.name.clone();
                    let token = token.clone();
                    extractions.spawn(async move {
                        extractor.extract(&url, &category_name, &token).await
                    });
                }
            }
            Ok(None) => break,
            Err(e) => {
                extractions.abort_all();
                return CategoryOutcome::failed(category, 0, &CategoryError::Pagination(e));
            }
        }
    }

    // Extracting: collect results, enforcing the failure threshold. The
    // first product error is kept so a threshold abort can name its cause.
    let mut records = Vec::new();
    let mut failed = 0u32;
    let mut first_error: Option<String> = None;
    while let Some(joined) = extractions.join_next().await {
        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                error!("extraction task aborted in '{}': {e}", category.name);
                failed += 1;
                first_error.get_or_insert_with(|| e.to_string());
                continue;
            }
        };
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                failed += 1;
                warn!("product dropped in '{}': {e}", category.name);
                first_error.get_or_insert_with(|| e.to_string());
                if failed > ctx.max_category_failures {
                    extractions.abort_all();
                    let error = CategoryError::TooManyFailures {
                        failed,
                        threshold: ctx.max_category_failures,
                        first_error: first_error.unwrap_or_default(),
                    };
                    return CategoryOutcome::failed(category, failed, &error);
                }
            }
        }
    }

    // A cancelled category is failed, never written partially.
    if token.is_cancelled() {
        return CategoryOutcome::failed(category, failed, &CategoryError::Cancelled);
    }

    // Writing: all-or-nothing dataset persistence. CSV output is blocking
    // file I/O, so it runs off the async worker threads.
    let slug = category.slug();
    let written = records.len();
    let output_root = ctx.output_root.clone();
    let write_slug = slug.clone();
    let write_result = tokio::task::spawn_blocking(move || {
        dataset::write_dataset(&output_root, &write_slug, &records)
    })
    .await
    .unwrap_or_else(|e| Err(DatasetError::Io(std::io::Error::other(e))));

    match write_result {
        Ok(path) => {
            info!(
                "category '{}': {written} products written to {} ({failed} failed)",
                category.name,
                path.display(),
            );
            CategoryOutcome {
                category: category.name.clone(),
                slug,
                products_written: written,
                products_failed: failed,
                error: None,
            }
        }
        Err(e) => {
            let error = CategoryError::DatasetWrite(e);
            error!("category '{}': {error}", category.name);
            CategoryOutcome::failed(category, failed, &error)
        }
    }
}
