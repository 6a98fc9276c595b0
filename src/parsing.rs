//! HTML parsing layer.
//!
//! `document` wraps the HTML tree behind the small set of lookups the rest of
//! the pipeline needs; the three parsers hold pre-compiled selectors for the
//! catalog's root, listing and product detail pages.

pub mod category_parser;
pub mod document;
pub mod listing_parser;
pub mod product_parser;

pub use category_parser::CategoryParser;
pub use document::Document;
pub use listing_parser::ListingPageParser;
pub use product_parser::{ProductFields, ProductPageParser};
