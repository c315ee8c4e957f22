//! The normalized dataset and its read-only accessors.
//!
//! A [`Dataset`] is built once by the loader and never mutated afterwards.
//! Everything here is a pure function of its records, so defaults and
//! label resolution are reproducible across loads of the same files.

use crate::catalog::{CatalogEntry, VariableCatalog};
use crate::config::Preferences;
use crate::header::fold_text;
use crate::models::NormalizedRecord;
use crate::normalize::normalize_entity_code;
use serde::Serialize;
use std::collections::BTreeSet;

/// Separators tried when a label is not in the catalog (`CODE – Description`)
const LABEL_SEPARATORS: &[&str] = &[" – ", " — ", " - "];

/// Canonical, deduplicated, sorted indicator records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<NormalizedRecord>,
    catalog: VariableCatalog,
}

/// Preselected entity and indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Defaults {
    pub entity: Option<String>,
    pub indicator: Option<CatalogEntry>,
}

/// Headline numbers about a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub entities: usize,
    pub indicators: usize,
    pub sources: Vec<String>,
    pub first_period: Option<String>,
    pub last_period: Option<String>,
}

impl Dataset {
    /// Wrap records that are already labelled, deduplicated and sorted
    pub fn new(records: Vec<NormalizedRecord>, catalog: VariableCatalog) -> Self {
        Self { records, catalog }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn variable_catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    /// Sorted unique `YYYY-MM` keys
    pub fn period_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&str> = self.records.iter().map(|r| r.period_key.as_str()).collect();
        keys.into_iter().map(str::to_string).collect()
    }

    /// Sorted unique entity labels
    pub fn entities(&self) -> Vec<String> {
        let labels: BTreeSet<&str> = self.records.iter().map(|r| r.entity_label.as_str()).collect();
        labels.into_iter().map(str::to_string).collect()
    }

    /// Sorted unique source file names
    pub fn source_files(&self) -> Vec<String> {
        let sources: BTreeSet<&str> = self.records.iter().map(|r| r.source_file.as_str()).collect();
        sources.into_iter().map(str::to_string).collect()
    }

    /// Unique (label, code) pairs sorted by label
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.catalog.entries()
    }

    /// Indicator code for a catalog label.
    ///
    /// Falls back to the part before a `" – "`/`" - "` separator, then to
    /// the input itself. Never fails.
    pub fn resolve_label(&self, label: &str) -> String {
        if let Some(entry) = self.catalog().into_iter().find(|e| e.label == label) {
            return entry.code;
        }

        let split_at = LABEL_SEPARATORS
            .iter()
            .filter_map(|sep| label.find(sep))
            .min();

        if let Some(position) = split_at {
            let code = label[..position].trim();
            if !code.is_empty() {
                return code.to_string();
            }
        }

        label.to_string()
    }

    /// Entity label matching `query`: exact label, then entity code
    /// (zero-padded), then the first label containing it
    /// (case- and accent-insensitive)
    pub fn resolve_entity(&self, query: &str) -> Option<String> {
        let entities = self.entities();

        if let Some(exact) = entities.iter().find(|e| e.as_str() == query) {
            return Some(exact.clone());
        }

        let code = normalize_entity_code(query);
        if let Some(record) = self.records.iter().find(|r| r.entity_code == code) {
            return Some(record.entity_label.clone());
        }

        let needle = fold_text(query.trim());
        entities.into_iter().find(|e| fold_text(e).contains(&needle))
    }

    /// Preselected entity and indicator under `preferences`.
    ///
    /// Entity: first sorted label containing a preferred substring (tried in
    /// order), else the first label. Indicator: first preferred code present
    /// in the catalog, else the first catalog entry.
    pub fn defaults(&self, preferences: &Preferences) -> Defaults {
        let entities = self.entities();
        let entity = preferences
            .entity_substrings
            .iter()
            .map(|s| fold_text(s))
            .filter(|s| !s.is_empty())
            .find_map(|needle| {
                entities
                    .iter()
                    .find(|label| fold_text(label).contains(&needle))
                    .cloned()
            })
            .or_else(|| entities.first().cloned());

        let catalog = self.catalog();
        let indicator = preferences
            .indicator_codes
            .iter()
            .find_map(|code| catalog.iter().find(|e| &e.code == code).cloned())
            .or_else(|| catalog.first().cloned());

        Defaults { entity, indicator }
    }

    pub fn summary(&self) -> DatasetSummary {
        let entities: BTreeSet<&str> = self.records.iter().map(|r| r.entity_code.as_str()).collect();
        let indicators: BTreeSet<&str> =
            self.records.iter().map(|r| r.indicator_code.as_str()).collect();
        let periods = self.period_keys();

        DatasetSummary {
            rows: self.records.len(),
            entities: entities.len(),
            indicators: indicators.len(),
            sources: self.source_files(),
            first_period: periods.first().cloned(),
            last_period: periods.last().cloned(),
        }
    }
}
