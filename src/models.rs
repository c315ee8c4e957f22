//! Core data structures for indicator ingestion.
//!
//! Defines the canonical columns, raw and normalized records, and the
//! per-file outcomes that make up a load report.

use crate::constants::CANONICAL_HEADERS;
use crate::reader::{Delimiter, TextEncoding};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The six mandatory columns every source file must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalColumn {
    EntityCode,
    EntityDescription,
    Period,
    IndicatorCode,
    IndicatorDescription,
    Value,
}

impl CanonicalColumn {
    /// All canonical columns in file order
    pub const ALL: [CanonicalColumn; 6] = [
        CanonicalColumn::EntityCode,
        CanonicalColumn::EntityDescription,
        CanonicalColumn::Period,
        CanonicalColumn::IndicatorCode,
        CanonicalColumn::IndicatorDescription,
        CanonicalColumn::Value,
    ];

    /// Position of this column in [`CanonicalColumn::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical header text, e.g. `Código de entidad`
    pub fn header(self) -> &'static str {
        CANONICAL_HEADERS[self.index()]
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One source row projected onto the canonical columns, still untyped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub entity_code: String,
    pub entity_description: String,
    pub period: String,
    pub indicator_code: String,
    pub indicator_description: String,
    pub value: String,
    /// File name the row came from
    pub source_file: String,
}

/// A typed, normalized indicator observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Entity code, zero-padded to five characters
    pub entity_code: String,
    pub entity_description: String,
    /// `entity_code - entity_description`
    pub entity_label: String,
    /// First day of the observed month
    pub period_date: NaiveDate,
    /// `YYYY-MM`
    pub period_key: String,
    pub indicator_code: String,
    pub indicator_description: String,
    /// Disambiguated label from the variable catalog
    pub indicator_label: String,
    /// `None` when the source value was empty or unparseable
    pub value: Option<f64>,
    /// Provenance only, never used for filtering or deduplication
    pub source_file: String,
}

/// Why a discovered file contributed no rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Every (delimiter, encoding) combination failed; holds the last cause
    Unreadable(String),
    /// Canonical columns that no header mapped to
    MissingColumns(Vec<CanonicalColumn>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(cause) => write!(f, "unreadable: {}", cause),
            SkipReason::MissingColumns(columns) => {
                let names: Vec<&str> = columns.iter().map(|c| c.header()).collect();
                write!(f, "missing columns: {}", names.join(", "))
            }
        }
    }
}

/// Result of running one file through read and header mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FileStatus {
    Loaded {
        rows: usize,
        delimiter: Delimiter,
        encoding: TextEncoding,
    },
    Skipped(SkipReason),
}

/// Outcome for a single discovered file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, FileStatus::Loaded { .. })
    }
}

/// Row-level counters collected while normalizing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowCounters {
    /// Rows projected from all loaded files
    pub rows_read: usize,
    /// Rows dropped because their period did not parse
    pub rows_dropped_period: usize,
    /// Rows kept with a missing value
    pub values_missing: usize,
    /// Exact duplicates removed after normalization
    pub duplicates_removed: usize,
}

/// Diagnostics for one load: which files were used, which were skipped and why
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileOutcome>,
    pub rows: RowCounters,
    pub processing_time_ms: u128,
}

impl LoadReport {
    pub fn loaded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_loaded())
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&FileOutcome, &SkipReason)> {
        self.files.iter().filter_map(|f| match &f.status {
            FileStatus::Skipped(reason) => Some((f, reason)),
            FileStatus::Loaded { .. } => None,
        })
    }

    pub fn files_loaded(&self) -> usize {
        self.loaded().count()
    }

    pub fn files_skipped(&self) -> usize {
        self.files.len() - self.files_loaded()
    }
}
