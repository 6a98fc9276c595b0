//! Category discovery from the catalog root page.

use std::collections::HashSet;

use anyhow::Result;
use scraper::Selector;
use tracing::{debug, warn};
use url::Url;

use super::document::Document;
use crate::domain::CategoryRef;

/// Extracts the category navigation from the site root.
pub struct CategoryParser {
    nav_selectors: Vec<Selector>,
}

impl CategoryParser {
    /// Compile the navigation selectors.
    ///
    /// The primary selector targets the nested list inside the side
    /// navigation, which holds the real categories and excludes the
    /// "all books" header link; the unclassed-list form is kept as a
    /// fallback for the same structure without the wrapper div.
    pub fn new() -> Result<Self> {
        Ok(Self {
            nav_selectors: compile_selectors(&[
                "div.side_categories ul ul a",
                "ul:not([class]) a",
            ])?,
        })
    }

    /// Return one `CategoryRef` per distinct resolved URL, in source order.
    pub fn discover(&self, doc: &Document, base: &Url) -> Vec<CategoryRef> {
        for selector in &self.nav_selectors {
            let anchors = doc.select_all(selector);
            if anchors.is_empty() {
                continue;
            }

            let mut seen = HashSet::new();
            let mut categories = Vec::new();
            for anchor in anchors {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let url = match base.join(href) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("skipping category link '{href}': {e}");
                        continue;
                    }
                };
                let name = Document::normalized_text(anchor);
                if name.is_empty() {
                    continue;
                }
                if seen.insert(url.clone()) {
                    categories.push(CategoryRef {
                        name,
                        listing_url: url,
                    });
                }
            }

            if !categories.is_empty() {
                debug!("discovered {} categories", categories.len());
                return categories;
            }
        }

        Vec::new()
    }
}

pub(crate) fn compile_selectors(sources: &[&str]) -> Result<Vec<Selector>> {
    sources
        .iter()
        .map(|s| Selector::parse(s).map_err(|e| anyhow::anyhow!("invalid selector '{s}': {e}")))
        .collect()
}
