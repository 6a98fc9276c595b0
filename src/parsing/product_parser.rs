//! Field extraction from product detail pages.
//!
//! Every field is looked up independently; the first missing required element
//! or malformed numeric value fails the whole page. Partial results never
//! leave this module.

use anyhow::Result;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::Selector;
use tracing::debug;
use url::Url;

use super::category_parser::compile_selectors;
use super::document::Document;
use crate::domain::Rating;
use crate::error::ExtractionError;

/// Raw extracted product fields, before the image asset is fetched.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub upc: String,
    pub title: String,
    pub price_including_tax: Decimal,
    pub price_excluding_tax: Decimal,
    pub available_units: u32,
    pub description: String,
    pub category: String,
    pub rating: Rating,
    pub image_url: Url,
}

/// Parser for product detail pages, selectors compiled once.
pub struct ProductPageParser {
    title: Selector,
    info_label: Selector,
    breadcrumb: Selector,
    rating: Selector,
    description: Selector,
    gallery: Vec<Selector>,
    availability_count: Regex,
}

impl ProductPageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            title: compile("h1")?,
            info_label: compile("table th")?,
            breadcrumb: compile("ul.breadcrumb li a")?,
            rating: compile("p.star-rating")?,
            description: compile("#product_description + p")?,
            gallery: compile_selectors(&["#product_gallery img", "div.item.active img", "img"])?,
            availability_count: Regex::new(r"(\d+)\s+available")?,
        })
    }

    /// Extract all product fields from a parsed detail page.
    pub fn parse(
        &self,
        doc: &Document,
        page_url: &Url,
    ) -> Result<ProductFields, ExtractionError> {
        let title = doc
            .select_first(&self.title)
            .map(Document::normalized_text)
            .filter(|t| !t.is_empty())
            .ok_or(ExtractionError::MissingField("title"))?;

        let upc = doc
            .labeled_value(&self.info_label, "UPC")
            .ok_or(ExtractionError::MissingField("upc"))?;

        let price_including_tax = parse_price(
            "price_including_tax",
            &doc.labeled_value(&self.info_label, "Price (incl. tax)")
                .ok_or(ExtractionError::MissingField("price_including_tax"))?,
        )?;
        let price_excluding_tax = parse_price(
            "price_excluding_tax",
            &doc.labeled_value(&self.info_label, "Price (excl. tax)")
                .ok_or(ExtractionError::MissingField("price_excluding_tax"))?,
        )?;

        let availability = doc
            .labeled_value(&self.info_label, "Availability")
            .ok_or(ExtractionError::MissingField("availability"))?;
        let available_units = self.parse_availability(&availability)?;

        let description = doc
            .select_first(&self.description)
            .map(Document::normalized_text)
            .unwrap_or_default();

        let category = doc
            .select_all(&self.breadcrumb)
            .last()
            .map(|a| Document::normalized_text(*a))
            .filter(|c| !c.is_empty())
            .ok_or(ExtractionError::MissingField("category"))?;

        let rating_element = doc
            .select_first(&self.rating)
            .ok_or(ExtractionError::MissingField("rating"))?;
        let rating = rating_element
            .value()
            .classes()
            .find_map(Rating::from_class)
            .ok_or_else(|| {
                let classes: Vec<_> = rating_element.value().classes().collect();
                ExtractionError::malformed("rating", classes.join(" "))
            })?;

        let image_src = self
            .gallery
            .iter()
            .find_map(|sel| doc.select_first(sel))
            .and_then(|img| img.value().attr("src"))
            .ok_or(ExtractionError::MissingField("image"))?;
        let image_url = page_url
            .join(image_src)
            .map_err(|_| ExtractionError::malformed("image", image_src))?;

        debug!("extracted fields for '{title}' ({upc})");

        Ok(ProductFields {
            upc,
            title,
            price_including_tax,
            price_excluding_tax,
            available_units,
            description,
            category,
            rating,
            image_url,
        })
    }

    /// Parse "In stock (22 available)". The site also renders a bare
    /// "In stock" for some products, which counts as zero known units.
    fn parse_availability(&self, raw: &str) -> Result<u32, ExtractionError> {
        if let Some(captures) = self.availability_count.captures(raw) {
            return captures[1]
                .parse()
                .map_err(|_| ExtractionError::malformed("availability", raw));
        }
        if raw.to_lowercase().contains("in stock") {
            return Ok(0);
        }
        Err(ExtractionError::malformed("availability", raw))
    }
}

fn compile(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| anyhow::anyhow!("invalid selector '{source}': {e}"))
}

/// Strict price parsing: strip the `£` prefix only, then require the whole
/// remainder to be a decimal literal.
fn parse_price(field: &'static str, raw: &str) -> Result<Decimal, ExtractionError> {
    let cleaned = raw.trim().trim_start_matches('\u{a3}').trim_start();
    cleaned
        .parse::<Decimal>()
        .map_err(|_| ExtractionError::malformed(field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <ul class="breadcrumb">
              <li><a href="/">Home</a></li>
              <li><a href="/books">Books</a></li>
              <li><a href="/poetry">Poetry</a></li>
              <li class="active">A Light in the Attic</li>
            </ul>
            <div id="product_gallery"><img src="../../media/cache/fe/72/cover.jpg"/></div>
            <h1>A Light in the Attic</h1>
            <p class="star-rating Three"></p>
            <table class="table table-striped">{rows}</table>
            <div id="product_description"><h2>Product Description</h2></div>
            <p>It's hard to imagine a world without this book.</p>
            </body></html>"#
        )
    }

    const FULL_ROWS: &str = "\
        <tr><th>UPC</th><td>a897fe39b1053632</td></tr>\
        <tr><th>Price (excl. tax)</th><td>\u{a3}51.77</td></tr>\
        <tr><th>Price (incl. tax)</th><td>\u{a3}51.77</td></tr>\
        <tr><th>Availability</th><td>In stock (22 available)</td></tr>";

    fn page_url() -> Url {
        Url::parse("https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html")
            .unwrap()
    }

    #[test]
    fn parses_a_complete_product_page() {
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(product_page(FULL_ROWS).as_bytes());

        let fields = parser.parse(&doc, &page_url()).unwrap();
        assert_eq!(fields.upc, "a897fe39b1053632");
        assert_eq!(fields.title, "A Light in the Attic");
        assert_eq!(fields.price_including_tax, Decimal::new(5177, 2));
        assert_eq!(fields.price_excluding_tax, Decimal::new(5177, 2));
        assert_eq!(fields.available_units, 22);
        assert_eq!(fields.category, "Poetry");
        assert_eq!(fields.rating, Rating::Three);
        assert_eq!(
            fields.description,
            "It's hard to imagine a world without this book."
        );
        assert_eq!(
            fields.image_url.as_str(),
            "https://books.toscrape.com/media/cache/fe/72/cover.jpg"
        );
    }

    #[test]
    fn missing_upc_is_a_missing_field() {
        let rows = FULL_ROWS.replace("UPC", "SKU");
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(product_page(&rows).as_bytes());

        let err = parser.parse(&doc, &page_url()).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField("upc")));
    }

    #[test]
    fn non_numeric_price_is_malformed() {
        let rows = FULL_ROWS.replace("\u{a3}51.77", "call us");
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(product_page(&rows).as_bytes());

        let err = parser.parse(&doc, &page_url()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MalformedField { field, .. } if field.starts_with("price")
        ));
    }

    #[test]
    fn bare_in_stock_counts_as_zero_units() {
        let rows = FULL_ROWS.replace("In stock (22 available)", "In stock");
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(product_page(&rows).as_bytes());

        let fields = parser.parse(&doc, &page_url()).unwrap();
        assert_eq!(fields.available_units, 0);
    }

    #[test]
    fn unknown_availability_text_is_malformed() {
        let rows = FULL_ROWS.replace("In stock (22 available)", "ask in store");
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(product_page(&rows).as_bytes());

        let err = parser.parse(&doc, &page_url()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MalformedField {
                field: "availability",
                ..
            }
        ));
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let page = product_page(FULL_ROWS).replace("product_description", "other_section");
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(page.as_bytes());

        let fields = parser.parse(&doc, &page_url()).unwrap();
        assert_eq!(fields.description, "");
    }

    #[test]
    fn unknown_rating_class_is_malformed() {
        let page = product_page(FULL_ROWS).replace("star-rating Three", "star-rating Zero");
        let parser = ProductPageParser::new().unwrap();
        let doc = Document::parse(page.as_bytes());

        let err = parser.parse(&doc, &page_url()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MalformedField { field: "rating", .. }
        ));
    }

    #[test]
    fn price_parsing_is_strict() {
        assert_eq!(
            parse_price("p", "\u{a3}10.00").unwrap(),
            Decimal::new(1000, 2)
        );
        assert!(parse_price("p", "\u{a3}ten pounds").is_err());
        assert!(parse_price("p", "").is_err());
    }

    #[test]
    fn price_parsing_strips_only_the_currency_sign() {
        assert!(parse_price("p", "approx 12.5").is_err());
        assert!(parse_price("p", "12.5 approx").is_err());
        assert_eq!(
            parse_price("p", "\u{a3}.50").unwrap(),
            Decimal::new(50, 2)
        );
        assert_eq!(parse_price("p", " \u{a3} 7.99 ").unwrap(), Decimal::new(799, 2));
    }
}
