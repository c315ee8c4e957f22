//! Builders shared by unit tests

use crate::catalog::VariableCatalog;
use crate::dataset::Dataset;
use crate::models::{NormalizedRecord, RawRecord};
use crate::normalize::normalize_record;
use crate::processor::dedup::sort_canonical;
use std::fs;
use std::path::{Path, PathBuf};

/// Header line using the canonical column names
pub const CANONICAL_HEADER_LINE: &str =
    "Código de entidad;Descripción entidad;Fecha del dato;Código del dato;Descripción del dato;Valor";

/// Normalized record from raw cells; `period` must be a valid `YYYYMM`
pub fn record(
    entity_code: &str,
    entity_description: &str,
    period: &str,
    indicator_code: &str,
    indicator_description: &str,
    value: &str,
) -> NormalizedRecord {
    let raw = RawRecord {
        entity_code: entity_code.to_string(),
        entity_description: entity_description.to_string(),
        period: period.to_string(),
        indicator_code: indicator_code.to_string(),
        indicator_description: indicator_description.to_string(),
        value: value.to_string(),
        source_file: "test.csv".to_string(),
    };
    normalize_record(&raw).unwrap()
}

/// Labelled, sorted dataset over `records`
pub fn dataset(mut records: Vec<NormalizedRecord>) -> Dataset {
    let catalog = VariableCatalog::from_records(&records);
    catalog.apply(&mut records);
    sort_canonical(&mut records);
    Dataset::new(records, catalog)
}

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
