//! Field coercion for raw indicator rows.
//!
//! Turns the six text cells of a [`RawRecord`] into typed fields. A row whose
//! period does not parse is dropped; a value that does not parse is kept as
//! missing. Nothing here logs or touches shared state.

use crate::constants::{ENTITY_CODE_WIDTH, ENTITY_LABEL_SEPARATOR};
use crate::models::{NormalizedRecord, RawRecord};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static PERIOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]{4})([0-9]{2})\s*$").expect("period pattern is valid")
});

/// Trim and left-pad with zeros to five characters; longer codes are kept
pub fn normalize_entity_code(raw: &str) -> String {
    format!("{:0>width$}", raw.trim(), width = ENTITY_CODE_WIDTH)
}

/// `code - description`
pub fn entity_label(code: &str, description: &str) -> String {
    format!("{}{}{}", code, ENTITY_LABEL_SEPARATOR, description)
}

/// Parse a `YYYYMM` period into the first day of that month
pub fn parse_period(raw: &str) -> Option<NaiveDate> {
    let captures = PERIOD_PATTERN.captures(raw)?;
    let year = captures[1].parse::<i32>().ok()?;
    let month = captures[2].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Canonical `YYYY-MM` key for a period date
pub fn period_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse a locale-flexible numeric string.
///
/// Whitespace and a trailing `%` are removed. With both `,` and `.` present,
/// `.` is a thousands separator and `,` the decimal mark; with only `,` it is
/// the decimal mark; otherwise the string is parsed as is, so `1234.5678`
/// keeps `.` as decimal. Empty, unparseable and NaN inputs are missing.
pub fn parse_value(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.strip_suffix('%').unwrap_or(&compact);
    if compact.is_empty() {
        return None;
    }

    let has_comma = compact.contains(',');
    let has_dot = compact.contains('.');

    let numeric = if has_comma && has_dot {
        compact.replace('.', "").replace(',', ".")
    } else if has_comma {
        compact.replace(',', ".")
    } else {
        compact.to_string()
    };

    numeric.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Coerce one raw row; `None` when its period does not parse.
///
/// `indicator_label` is left empty; labels depend on every record and are
/// assigned by [`crate::catalog::VariableCatalog`].
pub fn normalize_record(raw: &RawRecord) -> Option<NormalizedRecord> {
    let period_date = parse_period(&raw.period)?;

    let entity_code = normalize_entity_code(&raw.entity_code);
    let entity_description = raw.entity_description.trim().to_string();

    Some(NormalizedRecord {
        entity_label: entity_label(&entity_code, &entity_description),
        entity_code,
        entity_description,
        period_key: period_key(period_date),
        period_date,
        indicator_code: raw.indicator_code.trim().to_string(),
        indicator_description: raw.indicator_description.trim().to_string(),
        indicator_label: String::new(),
        value: parse_value(&raw.value),
        source_file: raw.source_file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entity: &str, period: &str, value: &str) -> RawRecord {
        RawRecord {
            entity_code: entity.to_string(),
            entity_description: " Banco de la Nación Argentina ".to_string(),
            period: period.to_string(),
            indicator_code: " R1 ".to_string(),
            indicator_description: " Liquidez ".to_string(),
            value: value.to_string(),
            source_file: "INDICAD_FULL.csv".to_string(),
        }
    }

    #[test]
    fn test_entity_code_padding() {
        assert_eq!(normalize_entity_code("123"), "00123");
        assert_eq!(normalize_entity_code(" 7 "), "00007");
        assert_eq!(normalize_entity_code("00011"), "00011");
        assert_eq!(normalize_entity_code("123456"), "123456");
        assert_eq!(normalize_entity_code(""), "00000");
    }

    #[test]
    fn test_period_round_trip() {
        for (input, key) in [("202401", "2024-01"), ("199912", "1999-12"), (" 202006 ", "2020-06")] {
            let date = parse_period(input).unwrap();
            assert_eq!(period_key(date), key);
        }
        assert_eq!(
            parse_period("202402"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test]
    fn test_invalid_periods() {
        for input in ["202413", "202400", "20241", "2024011", "2024-01", "abcdef", "", "٢٠٢٤٠١"] {
            assert_eq!(parse_period(input), None, "{input:?}");
        }
    }

    #[test]
    fn test_value_locale_variants() {
        assert_eq!(parse_value("1.234,56"), Some(1234.56));
        assert_eq!(parse_value("1234,56"), Some(1234.56));
        assert_eq!(parse_value("1234.56"), Some(1234.56));
        assert_eq!(parse_value("12,5%"), Some(12.5));
        assert_eq!(parse_value(" 1 234,56 "), Some(1234.56));
        assert_eq!(parse_value("1.234.567,8"), Some(1234567.8));
        assert_eq!(parse_value("-3,5"), Some(-3.5));
        assert_eq!(parse_value("42"), Some(42.0));
    }

    #[test]
    fn test_value_missing() {
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("   "), None);
        assert_eq!(parse_value("%"), None);
        assert_eq!(parse_value("n/d"), None);
        assert_eq!(parse_value("1,2,3"), None);
        assert_eq!(parse_value("NaN"), None);
    }

    #[test]
    fn test_value_dot_only_is_decimal() {
        // A lone '.' is always the decimal mark, even when it looks like grouping
        assert_eq!(parse_value("1234.5678"), Some(1234.5678));
        assert_eq!(parse_value("1.234"), Some(1.234));
        // Both separators: '.' is dropped as grouping, whatever the order
        assert_eq!(parse_value("1,234.56"), Some(1.23456));
    }

    #[test]
    fn test_normalize_record() {
        let record = normalize_record(&raw("11", "202401", "1.234,56")).unwrap();

        assert_eq!(record.entity_code, "00011");
        assert_eq!(record.entity_description, "Banco de la Nación Argentina");
        assert_eq!(record.entity_label, "00011 - Banco de la Nación Argentina");
        assert_eq!(record.period_key, "2024-01");
        assert_eq!(record.indicator_code, "R1");
        assert_eq!(record.indicator_description, "Liquidez");
        assert_eq!(record.value, Some(1234.56));
        assert_eq!(record.source_file, "INDICAD_FULL.csv");
        assert!(record.indicator_label.is_empty());
    }

    #[test]
    fn test_bad_period_drops_row_bad_value_keeps_it() {
        assert!(normalize_record(&raw("11", "2024-01", "1")).is_none());

        let record = normalize_record(&raw("11", "202401", "s/d")).unwrap();
        assert_eq!(record.value, None);
    }

    #[test]
    fn test_empty_entity_description() {
        let mut input = raw("11", "202401", "1");
        input.entity_description = String::new();
        let record = normalize_record(&input).unwrap();
        assert_eq!(record.entity_label, "00011 - ");
    }
}
