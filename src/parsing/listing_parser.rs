//! Product link extraction from category listing pages.

use std::collections::HashSet;

use anyhow::Result;
use scraper::Selector;
use tracing::warn;
use url::Url;

use super::category_parser::compile_selectors;
use super::document::Document;

/// Extracts product detail links from one listing page.
pub struct ListingPageParser {
    link_selectors: Vec<Selector>,
}

impl ListingPageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            link_selectors: compile_selectors(&["article.product_pod h3 a", "h3 > a"])?,
        })
    }

    /// All product detail URLs on the page, resolved against the page URL,
    /// in source order with duplicates collapsed.
    pub fn product_links(&self, doc: &Document, page_url: &Url) -> Vec<Url> {
        for selector in &self.link_selectors {
            let anchors = doc.select_all(selector);
            if anchors.is_empty() {
                continue;
            }

            let mut seen = HashSet::new();
            let mut links = Vec::new();
            for anchor in anchors {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                match page_url.join(href) {
                    Ok(url) => {
                        if seen.insert(url.clone()) {
                            links.push(url);
                        }
                    }
                    Err(e) => warn!("skipping product link '{href}' on {page_url}: {e}"),
                }
            }
            return links;
        }

        Vec::new()
    }
}
