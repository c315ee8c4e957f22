//! Header reconciliation for loosely-structured indicator files.
//!
//! Source files name the same six columns in many ways (`Código de entidad`,
//! `Cod Entidad`, `N°CODENT`, ...). Headers are folded to a plain ASCII key
//! and looked up in a static synonym table, so spelling, accents, case,
//! punctuation and stray whitespace or BOM characters do not matter.

use crate::models::{CanonicalColumn, RawRecord};
use std::collections::HashMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use CanonicalColumn::{
    EntityCode, EntityDescription, IndicatorCode, IndicatorDescription, Period, Value,
};

/// Normalized synonym -> canonical column.
///
/// Keys must already be in [`normalize_header`] form.
pub static HEADER_SYNONYMS: &[(&str, CanonicalColumn)] = &[
    // Entity code
    ("codigo de entidad", EntityCode),
    ("codigo entidad", EntityCode),
    ("cod de entidad", EntityCode),
    ("cod entidad", EntityCode),
    ("cod ent", EntityCode),
    ("codent", EntityCode),
    ("n codent", EntityCode),
    ("no codent", EntityCode),
    ("nro codent", EntityCode),
    ("nro entidad", EntityCode),
    ("numero de entidad", EntityCode),
    ("numero entidad", EntityCode),
    ("id entidad", EntityCode),
    ("entity code", EntityCode),
    // Entity description
    ("descripcion entidad", EntityDescription),
    ("descripcion de entidad", EntityDescription),
    ("desc entidad", EntityDescription),
    ("nombre entidad", EntityDescription),
    ("nombre de entidad", EntityDescription),
    ("denominacion entidad", EntityDescription),
    ("denominacion", EntityDescription),
    ("entidad", EntityDescription),
    ("razon social", EntityDescription),
    ("entity", EntityDescription),
    ("entity name", EntityDescription),
    // Period
    ("fecha del dato", Period),
    ("fecha dato", Period),
    ("fecha", Period),
    ("fecha aaaamm", Period),
    ("periodo", Period),
    ("period", Period),
    ("mes", Period),
    ("aaaamm", Period),
    ("yyyymm", Period),
    // Indicator code
    ("codigo del dato", IndicatorCode),
    ("codigo dato", IndicatorCode),
    ("cod del dato", IndicatorCode),
    ("cod dato", IndicatorCode),
    ("variable", IndicatorCode),
    ("codigo variable", IndicatorCode),
    ("cod variable", IndicatorCode),
    ("indicador", IndicatorCode),
    ("codigo indicador", IndicatorCode),
    ("cod indicador", IndicatorCode),
    ("indicator code", IndicatorCode),
    // Indicator description
    ("descripcion del dato", IndicatorDescription),
    ("descripcion dato", IndicatorDescription),
    ("desc dato", IndicatorDescription),
    ("descripcion", IndicatorDescription),
    ("descripcion variable", IndicatorDescription),
    ("descripcion indicador", IndicatorDescription),
    ("nombre variable", IndicatorDescription),
    ("nombre indicador", IndicatorDescription),
    ("indicator", IndicatorDescription),
    ("indicator description", IndicatorDescription),
    // Value
    ("valor", Value),
    ("valor del dato", Value),
    ("valor dato", Value),
    ("value", Value),
    ("importe", Value),
    ("monto", Value),
];

static SYNONYM_INDEX: LazyLock<HashMap<&'static str, CanonicalColumn>> =
    LazyLock::new(|| HEADER_SYNONYMS.iter().copied().collect());

/// Lower-case and strip diacritics (`Descripción` -> `descripcion`)
pub fn fold_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Reduce a raw header to its lookup key: folded, `[a-z0-9 ]` only,
/// single-spaced and trimmed
pub fn normalize_header(raw: &str) -> String {
    let replaced: String = fold_text(raw)
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical column a raw header stands for, if any
pub fn canonical_for(raw: &str) -> Option<CanonicalColumn> {
    SYNONYM_INDEX.get(normalize_header(raw).as_str()).copied()
}

/// Map every raw header to its canonical column (or `None`)
pub fn map_headers<S: AsRef<str>>(headers: &[S]) -> Vec<Option<CanonicalColumn>> {
    headers.iter().map(|h| canonical_for(h.as_ref())).collect()
}

/// Resolved positions of the canonical columns within one file's header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    positions: [Option<usize>; 6],
}

impl HeaderMapping {
    /// Resolve canonical columns; when several headers map to the same
    /// column the leftmost one wins
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut positions = [None; 6];

        for (index, canonical) in map_headers(headers).into_iter().enumerate() {
            if let Some(column) = canonical {
                let slot = &mut positions[column.index()];
                if slot.is_none() {
                    *slot = Some(index);
                }
            }
        }

        Self { positions }
    }

    /// Index of the raw column holding `column`
    pub fn index_of(&self, column: CanonicalColumn) -> Option<usize> {
        self.positions[column.index()]
    }

    /// Canonical columns no header mapped to, in canonical order
    pub fn missing(&self) -> Vec<CanonicalColumn> {
        CanonicalColumn::ALL
            .iter()
            .copied()
            .filter(|c| self.index_of(*c).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(Option::is_some)
    }

    /// Project a raw row onto the canonical columns.
    ///
    /// Returns `None` unless every canonical column is mapped.
    pub fn project(&self, row: &[String], source_file: &str) -> Option<RawRecord> {
        let cell = |column: CanonicalColumn| -> Option<String> {
            let index = self.index_of(column)?;
            Some(row.get(index).cloned().unwrap_or_default())
        };

        Some(RawRecord {
            entity_code: cell(EntityCode)?,
            entity_description: cell(EntityDescription)?,
            period: cell(Period)?,
            indicator_code: cell(IndicatorCode)?,
            indicator_description: cell(IndicatorDescription)?,
            value: cell(Value)?,
            source_file: source_file.to_string(),
        })
    }
}
