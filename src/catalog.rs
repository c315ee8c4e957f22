//! Variable catalog: human-readable, unique indicator labels.
//!
//! Every code gets exactly one label. A code observed with several
//! descriptions is described by its most frequent one (alphabetically first
//! on ties). When one description is shared by several codes, each code gets
//! a numbered suffix assigned in ascending code order, so `R1`/`R2` both
//! described as "Liquidity" become "Liquidity (1)" and "Liquidity (2)".
//! Suffixes skip numbers whose label is already taken by another
//! description. Labels never depend on the order files were read in.

use crate::constants::EMPTY_LABEL_PLACEHOLDER;
use crate::models::NormalizedRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CatalogEntry {
    pub label: String,
    pub code: String,
}

/// Disambiguated label for every observed indicator code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableCatalog {
    labels: BTreeMap<String, String>,
}

impl VariableCatalog {
    /// Build from (description, code) observations, one per record
    pub fn build<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        for (description, code) in pairs {
            *counts.entry(code).or_default().entry(description).or_default() += 1;
        }

        let mut codes_by_base: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (code, descriptions) in &counts {
            // max_by_key keeps the last maximum; reversed, that is the alphabetically first
            let description = descriptions
                .iter()
                .rev()
                .max_by_key(|(_, count)| **count)
                .map(|(description, _)| *description)
                .unwrap_or_default();
            let base = if description.is_empty() {
                EMPTY_LABEL_PLACEHOLDER
            } else {
                description
            };
            codes_by_base.entry(base).or_default().insert(*code);
        }

        let mut taken: BTreeSet<String> = codes_by_base
            .iter()
            .filter(|(_, codes)| codes.len() == 1)
            .map(|(base, _)| base.to_string())
            .collect();

        let mut labels = BTreeMap::new();
        for (base, codes) in &codes_by_base {
            if codes.len() == 1 {
                for code in codes {
                    labels.insert(code.to_string(), base.to_string());
                }
                continue;
            }

            let mut suffix = 0;
            for code in codes {
                let label = loop {
                    suffix += 1;
                    let candidate = format!("{} ({})", base, suffix);
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                };
                taken.insert(label.clone());
                labels.insert(code.to_string(), label);
            }
        }

        Self { labels }
    }

    /// Build from normalized records
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        Self::build(
            records
                .iter()
                .map(|r| (r.indicator_description.as_str(), r.indicator_code.as_str())),
        )
    }

    /// Label assigned to an indicator code
    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Fill `indicator_label` on every record
    pub fn apply(&self, records: &mut [NormalizedRecord]) {
        for record in records {
            if let Some(label) = self.label_for(&record.indicator_code) {
                record.indicator_label = label.to_string();
            }
        }
    }

    /// One (label, code) pair per code, sorted by label, then code
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = self
            .labels
            .iter()
            .map(|(code, label)| CatalogEntry {
                label: label.clone(),
                code: code.clone(),
            })
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
