//! Lenient HTML document adapter.
//!
//! Parsing never fails: malformed markup yields a best-effort tree, and a
//! missing element surfaces as `None` for the caller to classify. This keeps
//! parser faults out of the pipeline; only extraction-level errors exist.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page with selector-based lookups.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse raw document bytes. Invalid UTF-8 is replaced, not rejected.
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            html: Html::parse_document(&String::from_utf8_lossy(bytes)),
        }
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.select(selector).collect()
    }

    /// Find the first element matching `selector` whose normalized text equals
    /// `text`, then return the text of its next element sibling.
    ///
    /// This is the `<th>label</th><td>value</td>` table shape on product
    /// detail pages.
    pub fn labeled_value(&self, selector: &Selector, text: &str) -> Option<String> {
        self.html
            .select(selector)
            .find(|el| Self::normalized_text(*el) == text)
            .and_then(Self::following_sibling_element)
            .map(Self::normalized_text)
    }

    /// The next sibling that is an element, skipping text and comment nodes.
    pub fn following_sibling_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
        element.next_siblings().find_map(ElementRef::wrap)
    }

    /// Element text with runs of whitespace collapsed to single spaces.
    pub fn normalized_text(element: ElementRef<'_>) -> String {
        element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn labeled_value_reads_table_rows() {
        let doc = Document::parse(
            b"<table><tr><th>UPC</th><td>a897fe39b1053632</td></tr>\
              <tr><th>Tax</th><td>\xc2\xa30.00</td></tr></table>",
        );
        assert_eq!(
            doc.labeled_value(&selector("th"), "UPC").as_deref(),
            Some("a897fe39b1053632")
        );
        assert_eq!(doc.labeled_value(&selector("th"), "Missing"), None);
    }

    #[test]
    fn text_is_whitespace_normalized() {
        let doc = Document::parse(b"<h1>  A  Light in the\n   Attic </h1>");
        let h1 = doc.select_first(&selector("h1")).unwrap();
        assert_eq!(Document::normalized_text(h1), "A Light in the Attic");
    }

    #[test]
    fn malformed_markup_still_parses() {
        let doc = Document::parse(b"<div><p>unclosed<table><tr><td>cell");
        assert!(doc.select_first(&selector("td")).is_some());
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let doc = Document::parse(b"<p>\xff\xfe broken</p>");
        assert!(doc.select_first(&selector("p")).is_some());
    }
}
