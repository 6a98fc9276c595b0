//! Listing page traversal for one category.
//!
//! Forward-only and non-restartable: each call to [`ListingPaginator::next_page`]
//! fetches the next page index, so the sequence cannot be iterated twice
//! without re-fetching. Page indices are monotonic and never revisited.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;
use crate::http_client::HttpClient;
use crate::parsing::{Document, ListingPageParser};

/// Walks a category's listing pages until exhaustion.
pub struct ListingPaginator {
    http: Arc<HttpClient>,
    parser: Arc<ListingPageParser>,
    first_page: Url,
    next_index: u32,
    seen: HashSet<Url>,
    done: bool,
}

impl ListingPaginator {
    pub fn new(http: Arc<HttpClient>, parser: Arc<ListingPageParser>, first_page: Url) -> Self {
        Self {
            http,
            parser,
            first_page,
            next_index: 1,
            seen: HashSet::new(),
            done: false,
        }
    }

    /// Fetch the next listing page and return its new product URLs.
    ///
    /// `Ok(None)` is the normal terminal condition: a 404 past page 1, or a
    /// page with no unseen product links (defensive stop against unexpected
    /// markup). Any other fetch failure ends the category as an error.
    pub async fn next_page(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<Vec<Url>>, FetchError> {
        if self.done {
            return Ok(None);
        }

        let index = self.next_index;
        let Some(url) = self.page_url(index) else {
            warn!("could not build listing URL for page {index}, stopping");
            self.done = true;
            return Ok(None);
        };

        match self.http.fetch_with_retry(&url, token).await {
            Ok(body) => {
                let links = {
                    let doc = Document::parse(&body);
                    self.parser.product_links(&doc, &url)
                };
                let fresh: Vec<Url> = links
                    .into_iter()
                    .filter(|u| self.seen.insert(u.clone()))
                    .collect();

                if fresh.is_empty() {
                    debug!("no new product links on page {index} of {}", self.first_page);
                    self.done = true;
                    return Ok(None);
                }

                debug!("page {index}: {} product links", fresh.len());
                self.next_index += 1;
                Ok(Some(fresh))
            }
            Err(e) if e.status() == Some(404) && index > 1 => {
                debug!("page {index} returned 404, pagination complete");
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Page 1 is the category's index page; later pages substitute the
    /// `page-N.html` segment the way the site names them.
    fn page_url(&self, index: u32) -> Option<Url> {
        if index == 1 {
            Some(self.first_page.clone())
        } else {
            self.first_page.join(&format!("page-{index}.html")).ok()
        }
    }
}
