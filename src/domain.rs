//! Core domain types for the catalog crawl.

pub mod product;

pub use product::{CategoryRef, ProductRecord, Rating};
