//! Dataset export to Parquet and CSV via polars.
//!
//! The dataset is materialized as a [`DataFrame`] with one column per
//! normalized field. Source files are never touched.

use crate::dataset::Dataset;
use crate::error::{IngestError, Result};
use crate::models::NormalizedRecord;
use chrono::Datelike;
use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Days from 0001-01-01 (CE) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Column names, in frame order
pub const EXPORT_COLUMNS: [&str; 9] = [
    "entity_code",
    "entity_label",
    "period_date",
    "period_key",
    "indicator_code",
    "indicator_description",
    "indicator_label",
    "value",
    "source_file",
];

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum ExportFormat {
    /// Snappy-compressed Parquet
    Parquet,
    /// Semicolon-separated CSV with a header row
    Csv,
}

impl ExportFormat {
    /// Guess from the file extension; anything but `.csv` is Parquet
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Parquet,
        }
    }
}

/// Build a frame holding every record of `dataset`
pub fn to_dataframe(dataset: &Dataset) -> Result<DataFrame> {
    let records = dataset.records();

    let days: Vec<i32> = records
        .iter()
        .map(|r| r.period_date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let period_date = Series::new(EXPORT_COLUMNS[2].into(), days).cast(&DataType::Date)?;

    let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();

    let columns: Vec<Column> = vec![
        text_column(EXPORT_COLUMNS[0], records, |r| r.entity_code.as_str()),
        text_column(EXPORT_COLUMNS[1], records, |r| r.entity_label.as_str()),
        period_date.into(),
        text_column(EXPORT_COLUMNS[3], records, |r| r.period_key.as_str()),
        text_column(EXPORT_COLUMNS[4], records, |r| r.indicator_code.as_str()),
        text_column(EXPORT_COLUMNS[5], records, |r| r.indicator_description.as_str()),
        text_column(EXPORT_COLUMNS[6], records, |r| r.indicator_label.as_str()),
        Column::new(EXPORT_COLUMNS[7].into(), values),
        text_column(EXPORT_COLUMNS[8], records, |r| r.source_file.as_str()),
    ];

    Ok(DataFrame::new(columns)?)
}

fn text_column(
    name: &str,
    records: &[NormalizedRecord],
    field: impl Fn(&NormalizedRecord) -> &str,
) -> Column {
    let values: Vec<&str> = records.iter().map(field).collect();
    Column::new(name.into(), values)
}

/// Write `dataset` to `path` in `format`; returns the number of rows written
pub fn write_dataset(dataset: &Dataset, path: &Path, format: ExportFormat) -> Result<usize> {
    let mut df = to_dataframe(dataset)?;
    debug!(
        "Exporting {} rows x {} columns to {}",
        df.height(),
        df.width(),
        path.display()
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let export_error = |e: PolarsError| IngestError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    match format {
        ExportFormat::Parquet => {
            let file = File::create(path)?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(export_error)?;
        }
        ExportFormat::Csv => {
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(b';')
                .finish(&mut df)
                .map_err(export_error)?;
        }
    }

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(df.height())
}
