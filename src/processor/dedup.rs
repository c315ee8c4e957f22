//! Exact-duplicate removal and canonical ordering for normalized records
//!
//! Two records are duplicates when every normalized field matches;
//! `source_file` is provenance and is ignored. The first occurrence in load
//! order (earliest file, earliest row) is the one kept.

use crate::models::NormalizedRecord;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

/// Identity of a record for duplicate detection, provenance excluded
#[derive(Debug, PartialEq, Eq, Hash)]
struct RecordKey<'a> {
    entity_code: &'a str,
    entity_description: &'a str,
    entity_label: &'a str,
    period_date: NaiveDate,
    period_key: &'a str,
    indicator_code: &'a str,
    indicator_description: &'a str,
    indicator_label: &'a str,
    /// Bit pattern of the value; NaN never reaches this point
    value_bits: Option<u64>,
}

impl<'a> RecordKey<'a> {
    fn of(record: &'a NormalizedRecord) -> Self {
        Self {
            entity_code: &record.entity_code,
            entity_description: &record.entity_description,
            entity_label: &record.entity_label,
            period_date: record.period_date,
            period_key: &record.period_key,
            indicator_code: &record.indicator_code,
            indicator_description: &record.indicator_description,
            indicator_label: &record.indicator_label,
            // -0.0 and 0.0 compare equal as numbers
            value_bits: record
                .value
                .map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }),
        }
    }
}

/// Drop exact duplicates, keeping first occurrences in their original order.
///
/// Returns the survivors and the number of records removed.
pub fn deduplicate_records(records: Vec<NormalizedRecord>) -> (Vec<NormalizedRecord>, usize) {
    let total = records.len();

    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(total);
        records
            .iter()
            .map(|record| seen.insert(RecordKey::of(record)))
            .collect()
    };

    let deduplicated: Vec<NormalizedRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();

    let removed = total - deduplicated.len();
    if removed > 0 {
        debug!("Removed {} duplicate records", removed);
    }

    (deduplicated, removed)
}

/// Stable sort by `(period_date, entity_code, indicator_code)`
pub fn sort_canonical(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| {
        a.period_date
            .cmp(&b.period_date)
            .then_with(|| a.entity_code.cmp(&b.entity_code))
            .then_with(|| a.indicator_code.cmp(&b.indicator_code))
    });
}
