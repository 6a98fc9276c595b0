//! Per-product extraction: detail page to `ProductRecord`.
//!
//! Extraction is atomic. The record is assembled only after every field
//! parsed and the image download succeeded; any failure along the way
//! discards the product entirely.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::crawler::assets::AssetDownloader;
use crate::domain::ProductRecord;
use crate::error::ExtractionError;
use crate::http_client::HttpClient;
use crate::parsing::{Document, ProductPageParser};

/// Turns one product detail URL into a fully-populated record.
pub struct ProductExtractor {
    http: Arc<HttpClient>,
    parser: ProductPageParser,
    assets: AssetDownloader,
}

impl ProductExtractor {
    pub fn new(http: Arc<HttpClient>, parser: ProductPageParser, assets: AssetDownloader) -> Self {
        Self {
            http,
            parser,
            assets,
        }
    }

    /// Fetch, parse and complete one product. `category` names the asset
    /// directory for the image download.
    pub async fn extract(
        &self,
        url: &Url,
        category: &str,
        token: &CancellationToken,
    ) -> Result<ProductRecord, ExtractionError> {
        let body = self.http.fetch_with_retry(url, token).await?;

        // The document borrows the body and is dropped before the next await.
        let fields = {
            let doc = Document::parse(&body);
            self.parser.parse(&doc, url)
        }?;

        let image_local_path = self
            .assets
            .download(&fields.image_url, category, &fields.title, token)
            .await?;

        debug!("extracted '{}' from {url}", fields.title);

        Ok(ProductRecord {
            source_url: url.clone(),
            upc: fields.upc,
            title: fields.title,
            price_including_tax: fields.price_including_tax,
            price_excluding_tax: fields.price_excluding_tax,
            available_units: fields.available_units,
            description: fields.description,
            category: fields.category,
            rating: fields.rating,
            image_url: fields.image_url,
            image_local_path: image_local_path.display().to_string(),
        })
    }
}
