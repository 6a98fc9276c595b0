//! Category dataset persistence.
//!
//! One CSV file per category with a fixed column schema. Writing is
//! all-or-nothing: rows go to a temp file that is renamed into place only
//! after a successful flush, so a partially-written dataset never appears
//! under the final name. The header is always present, so an empty category
//! still produces a well-formed file.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ProductRecord, Rating};
use crate::error::DatasetError;

/// Fixed column order of every dataset.
pub const COLUMNS: [&str; 10] = [
    "product_page_url",
    "universal_product_code (upc)",
    "title",
    "price_including_tax",
    "price_excluding_tax",
    "number_available",
    "product_description",
    "category",
    "review_rating",
    "image_url",
];

/// One serialized dataset row, mirroring [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub product_page_url: String,
    #[serde(rename = "universal_product_code (upc)")]
    pub universal_product_code: String,
    pub title: String,
    pub price_including_tax: Decimal,
    pub price_excluding_tax: Decimal,
    pub number_available: u32,
    pub product_description: String,
    pub category: String,
    pub review_rating: Rating,
    pub image_url: String,
}

impl From<&ProductRecord> for DatasetRow {
    fn from(record: &ProductRecord) -> Self {
        Self {
            product_page_url: record.source_url.to_string(),
            universal_product_code: record.upc.clone(),
            title: record.title.clone(),
            price_including_tax: record.price_including_tax,
            price_excluding_tax: record.price_excluding_tax,
            number_available: record.available_units,
            product_description: record.description.clone(),
            category: record.category.clone(),
            review_rating: record.rating,
            image_url: record.image_url.to_string(),
        }
    }
}

/// Final location of a category's dataset.
pub fn dataset_path(output_root: &Path, slug: &str) -> PathBuf {
    output_root.join("data").join(format!("{slug}.csv"))
}

/// Write one category's records, returning the dataset path.
pub fn write_dataset(
    output_root: &Path,
    slug: &str,
    records: &[ProductRecord],
) -> Result<PathBuf, DatasetError> {
    let data_dir = output_root.join("data");
    std::fs::create_dir_all(&data_dir)?;

    let path = dataset_path(output_root, slug);
    let tmp = data_dir.join(format!(".{slug}.csv.tmp"));

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        writer.write_record(COLUMNS)?;
        for record in records {
            writer.serialize(DatasetRow::from(record))?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp, &path)?;
    debug!("wrote {} rows to {}", records.len(), path.display());
    Ok(path)
}

/// Read a dataset back with the same schema.
pub fn read_dataset(path: &Path) -> Result<Vec<DatasetRow>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
