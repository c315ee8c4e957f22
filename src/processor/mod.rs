//! Dataset loading engine.
//!
//! Orchestrates discovery, flexible reading, header mapping, normalization,
//! labelling, deduplication and ordering of indicator files into a single
//! [`Dataset`] plus a [`LoadReport`] describing what happened to each file.
//!
//! A load never fails because of file contents: unreadable files and files
//! missing canonical columns are skipped and reported. Only a data directory
//! that exists but cannot be listed is an error.

pub mod dedup;
pub mod discovery;

#[cfg(test)]
pub mod tests;

use self::dedup::{deduplicate_records, sort_canonical};
use self::discovery::FileDiscovery;

use crate::catalog::VariableCatalog;
use crate::config::IngestConfig;
use crate::dataset::Dataset;
use crate::error::{IngestError, Result};
use crate::header::HeaderMapping;
use crate::models::{
    FileOutcome, FileStatus, LoadReport, NormalizedRecord, RawRecord, RowCounters, SkipReason,
};
use crate::normalize::normalize_record;
use crate::reader::read_flexible;

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stateless loader for a data directory.
///
/// Loading the same unchanged directory twice gives equal datasets; caching
/// is left to [`crate::cache::DatasetCache`].
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    config: IngestConfig,
}

impl DatasetLoader {
    /// Create a loader for `config.data_dir`
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Create a loader for `data_dir` with otherwise default settings
    pub fn for_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(IngestConfig::default().with_data_dir(data_dir))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Load every recognized file of the data directory
    pub fn load(&self) -> Result<(Dataset, LoadReport)> {
        let start_time = Instant::now();
        info!("Loading indicator files from {}", self.data_dir().display());

        let mut discovery = FileDiscovery::new(&self.config);
        let files = discovery.discover_files()?;

        let mut report = LoadReport::default();
        let mut raw_records = Vec::new();

        for path in &files {
            let (outcome, records) = load_file(path);
            match &outcome.status {
                FileStatus::Loaded {
                    rows,
                    delimiter,
                    encoding,
                } => debug!(
                    "Loaded {} rows from {} ({} / {})",
                    rows, outcome.file_name, delimiter, encoding
                ),
                FileStatus::Skipped(reason) => {
                    warn!("Skipping {}: {}", outcome.file_name, reason)
                }
            }
            raw_records.extend(records);
            report.files.push(outcome);
        }

        if raw_records.is_empty() {
            if report.files_loaded() == 0 {
                warn!(
                    "No usable indicator files in {} ({} discovered)",
                    self.data_dir().display(),
                    files.len()
                );
            }
            report.processing_time_ms = start_time.elapsed().as_millis();
            return Ok((Dataset::empty(), report));
        }

        let (records, counters) = normalize_all(raw_records);
        report.rows = counters;

        let catalog = VariableCatalog::from_records(&records);
        let mut records = records;
        catalog.apply(&mut records);

        let (mut records, duplicates_removed) = deduplicate_records(records);
        report.rows.duplicates_removed = duplicates_removed;
        sort_canonical(&mut records);

        report.processing_time_ms = start_time.elapsed().as_millis();

        info!(
            "Loaded {} records from {} of {} files in {}ms",
            records.len(),
            report.files_loaded(),
            report.files.len(),
            report.processing_time_ms
        );
        if report.rows.rows_dropped_period > 0 {
            info!(
                "Dropped {} rows with an invalid period",
                report.rows.rows_dropped_period
            );
        }

        Ok((Dataset::new(records, catalog), report))
    }
}

/// Read, map and project one file
fn load_file(path: &Path) -> (FileOutcome, Vec<RawRecord>) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let outcome = |status: FileStatus| FileOutcome {
        file_name: file_name.clone(),
        path: path.to_path_buf(),
        status,
    };

    let table = match read_flexible(path) {
        Ok(table) => table,
        Err(e) => {
            let reason = match e {
                IngestError::Unreadable { reason, .. } => reason,
                other => other.to_string(),
            };
            return (outcome(FileStatus::Skipped(SkipReason::Unreadable(reason))), Vec::new());
        }
    };

    let mapping = HeaderMapping::from_headers(&table.headers);
    let missing = mapping.missing();
    if !missing.is_empty() {
        debug!("Headers of {}: {:?}", file_name, table.headers);
        return (
            outcome(FileStatus::Skipped(SkipReason::MissingColumns(missing))),
            Vec::new(),
        );
    }

    let records: Vec<RawRecord> = table
        .rows
        .iter()
        .filter_map(|row| mapping.project(row, &file_name))
        .collect();

    let status = FileStatus::Loaded {
        rows: records.len(),
        delimiter: table.delimiter,
        encoding: table.encoding,
    };
    (outcome(status), records)
}

/// Normalize raw rows, counting dropped periods and missing values
fn normalize_all(raw_records: Vec<RawRecord>) -> (Vec<NormalizedRecord>, RowCounters) {
    let mut counters = RowCounters {
        rows_read: raw_records.len(),
        ..Default::default()
    };

    let mut records = Vec::with_capacity(raw_records.len());
    for raw in &raw_records {
        match normalize_record(raw) {
            Some(record) => {
                if record.value.is_none() {
                    counters.values_missing += 1;
                }
                records.push(record);
            }
            None => counters.rows_dropped_period += 1,
        }
    }

    (records, counters)
}
