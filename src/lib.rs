//! Indicator Ingest Library
//!
//! Loads loosely-structured economic indicator files (regulator CSV dumps
//! with varying delimiters, encodings and header spellings) into one
//! canonical, deduplicated dataset.
//!
//! This library provides tools for:
//! - Reading `;`, `,` and tab separated files in UTF-8 or Latin-1
//! - Reconciling header synonyms onto six canonical columns
//! - Normalizing entity codes, periods and locale-formatted values
//! - Building stable, disambiguated indicator labels
//! - Series, KPI panel, base-100, year-on-year and calculator projections
//! - Exporting the dataset to Parquet or CSV

pub mod analytics;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod export;
pub mod header;
pub mod models;
pub mod normalize;
pub mod processor;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use cache::DatasetCache;
pub use catalog::{CatalogEntry, VariableCatalog};
pub use config::{IngestConfig, Preferences};
pub use dataset::{Dataset, Defaults};
pub use error::{IngestError, Result};
pub use models::{CanonicalColumn, FileOutcome, FileStatus, LoadReport, NormalizedRecord, SkipReason};
pub use processor::DatasetLoader;
