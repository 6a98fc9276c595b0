//! Product and category data model.
//!
//! `ProductRecord` is the unit of output: it is only ever constructed fully
//! populated, after both field extraction and the image download succeeded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

/// One catalog category discovered on the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    /// Human-readable category name from the navigation link text.
    pub name: String,
    /// Absolute URL of the category's first listing page.
    pub listing_url: Url,
}

impl CategoryRef {
    /// Slug used for the category's dataset file.
    ///
    /// Taken from the listing URL's directory segment
    /// (`.../books/poetry_23/index.html` yields `poetry_23`), falling back to
    /// a name-derived slug for URLs without one.
    pub fn slug(&self) -> String {
        let mut segments: Vec<&str> = self
            .listing_url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        if segments.last().is_some_and(|s| s.ends_with(".html")) {
            segments.pop();
        }

        match segments.last() {
            Some(segment) => (*segment).to_string(),
            None => self.name.to_lowercase().replace(char::is_whitespace, "-"),
        }
    }
}

/// Star rating of a product, as rendered on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Rating {
    /// Parse the rating from a `star-rating <Rating>` CSS class token.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "One" => Some(Self::One),
            "Two" => Some(Self::Two),
            "Three" => Some(Self::Three),
            "Four" => Some(Self::Four),
            "Five" => Some(Self::Five),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "One",
            Self::Two => "Two",
            Self::Three => "Three",
            Self::Four => "Four",
            Self::Five => "Five",
        }
    }

    /// Number of stars, 1 through 5.
    pub fn stars(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-extracted product, ready to enter a category dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// Canonical detail page URL; unique key within a run.
    pub source_url: Url,
    /// Site-assigned universal product code.
    pub upc: String,
    pub title: String,
    pub price_including_tax: Decimal,
    pub price_excluding_tax: Decimal,
    pub available_units: u32,
    /// May be empty; some products carry no description.
    pub description: String,
    /// Category as stated in the detail page breadcrumb.
    pub category: String,
    pub rating: Rating,
    /// Absolute URL of the product image on the origin.
    pub image_url: Url,
    /// Local path of the downloaded image.
    pub image_local_path: String,
}
