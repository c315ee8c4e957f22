//! Flexible delimited-text reader.
//!
//! Source files arrive as `;`, `,` or tab separated text, encoded as UTF-8
//! (often with a BOM) or Latin-1. The reader tries a fixed list of
//! combinations and keeps the first one that tokenizes. Every cell is kept
//! as raw text; typing happens later in [`crate::normalize`].

use crate::error::{IngestError, Result};
use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Field delimiter candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Delimiter {
    Semicolon,
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Semicolon => b';',
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Semicolon => f.write_str("';'"),
            Delimiter::Comma => f.write_str("','"),
            Delimiter::Tab => f.write_str("tab"),
        }
    }
}

/// Text encoding candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextEncoding {
    /// UTF-8, with or without a leading BOM
    Utf8,
    /// ISO-8859-1, decoded as windows-1252 (its WHATWG superset)
    Latin1,
}

impl TextEncoding {
    /// Decode `bytes`; `None` on an invalid byte sequence.
    ///
    /// Latin-1 maps every byte to a character, so it never fails.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
            }
            TextEncoding::Latin1 => Some(WINDOWS_1252.decode_without_bom_handling(bytes).0),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("UTF-8"),
            TextEncoding::Latin1 => f.write_str("Latin-1"),
        }
    }
}

/// Attempt order; `;` + UTF-8 is the dominant format
pub const READ_ATTEMPTS: [(Delimiter, TextEncoding); 6] = [
    (Delimiter::Semicolon, TextEncoding::Utf8),
    (Delimiter::Semicolon, TextEncoding::Latin1),
    (Delimiter::Comma, TextEncoding::Utf8),
    (Delimiter::Comma, TextEncoding::Latin1),
    (Delimiter::Tab, TextEncoding::Utf8),
    (Delimiter::Tab, TextEncoding::Latin1),
];

/// A delimited file as text cells under its original headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: Delimiter,
    pub encoding: TextEncoding,
}

/// Read `path` with the first (delimiter, encoding) combination that parses
pub fn read_flexible(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_bytes(&bytes).map_err(|reason| IngestError::Unreadable {
        path: path.to_path_buf(),
        reason,
    })
}

/// Try every combination in [`READ_ATTEMPTS`] order; on total failure the
/// last cause is returned
pub fn parse_bytes(bytes: &[u8]) -> std::result::Result<RawTable, String> {
    let mut last_error = String::from("no read attempts");

    for (delimiter, encoding) in READ_ATTEMPTS {
        match try_parse(bytes, delimiter, encoding) {
            Ok(table) => {
                debug!(
                    "Parsed {} columns x {} rows with delimiter {} and {}",
                    table.headers.len(),
                    table.rows.len(),
                    delimiter,
                    encoding
                );
                return Ok(table);
            }
            Err(cause) => {
                debug!("Read attempt {} / {} failed: {}", delimiter, encoding, cause);
                last_error = format!("{} / {}: {}", delimiter, encoding, cause);
            }
        }
    }

    Err(last_error)
}

/// One read attempt.
///
/// Fails on a decode error, a tokenizing error, a row with more fields than
/// the header, or a header row that does not split on `delimiter` at all.
/// Short rows are padded with empty cells.
fn try_parse(
    bytes: &[u8],
    delimiter: Delimiter,
    encoding: TextEncoding,
) -> std::result::Result<RawTable, String> {
    let text = encoding
        .decode(bytes)
        .ok_or_else(|| format!("invalid {} byte sequence", encoding))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err("no columns to parse".to_string());
    }
    if headers.len() < 2 {
        return Err(format!("header row does not contain delimiter {}", delimiter));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        if record.len() > headers.len() {
            return Err(format!(
                "expected {} fields in row {}, saw {}",
                headers.len(),
                index + 1,
                record.len()
            ));
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable {
        headers,
        rows,
        delimiter,
        encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file_with(bytes: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(bytes).unwrap();
        temp_file
    }

    #[test]
    fn test_semicolon_utf8_with_bom() {
        let content = "\u{feff}Código de entidad;Valor\n00011;12,5\n";
        let table = parse_bytes(content.as_bytes()).unwrap();

        assert_eq!(table.delimiter, Delimiter::Semicolon);
        assert_eq!(table.encoding, TextEncoding::Utf8);
        assert_eq!(table.headers, vec!["Código de entidad", "Valor"]);
        assert_eq!(table.rows, vec![vec!["00011".to_string(), "12,5".to_string()]]);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Código" with 0xF3 for 'ó' is not valid UTF-8
        let bytes = b"C\xF3digo de entidad;Valor\n11;1\n";

        let table = parse_bytes(bytes).unwrap();
        assert_eq!(table.delimiter, Delimiter::Semicolon);
        assert_eq!(table.encoding, TextEncoding::Latin1);
        assert_eq!(table.headers[0], "Código de entidad");
    }

    #[test]
    fn test_comma_file_skips_single_column_semicolon_parse() {
        let content = "Código de entidad,Valor\n11,\"1,5\"\n";
        let table = parse_bytes(content.as_bytes()).unwrap();

        assert_eq!(table.delimiter, Delimiter::Comma);
        assert_eq!(table.encoding, TextEncoding::Utf8);
        assert_eq!(table.rows[0], vec!["11".to_string(), "1,5".to_string()]);
    }

    #[test]
    fn test_tab_file() {
        let content = "Código de entidad\tValor\n11\t2\n";
        let table = parse_bytes(content.as_bytes()).unwrap();
        assert_eq!(table.delimiter, Delimiter::Tab);
    }

    #[test]
    fn test_first_tokenizing_combination_wins_even_if_structurally_odd() {
        // Splits on ';' into two columns, so ';' is accepted despite the commas
        let content = "a,b;c\n1,2;3\n";
        let table = parse_bytes(content.as_bytes()).unwrap();
        assert_eq!(table.delimiter, Delimiter::Semicolon);
        assert_eq!(table.headers, vec!["a,b", "c"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let content = "a;b;c\n1;2\n";
        let table = parse_bytes(content.as_bytes()).unwrap();
        assert_eq!(table.rows[0], vec!["1".to_string(), "2".to_string(), String::new()]);
    }

    #[test]
    fn test_all_combinations_fail() {
        assert!(parse_bytes(b"").is_err());

        let error = parse_bytes(b"single\nvalue\n").unwrap_err();
        assert!(error.starts_with("tab / Latin-1"), "{error}");
    }

    #[test]
    fn test_long_row_fails_every_attempt() {
        let content = "a;b\n1;2;3\n";
        let error = parse_bytes(content.as_bytes()).unwrap_err();
        assert!(error.contains("header row does not contain delimiter"), "{error}");
    }

    #[test]
    fn test_read_flexible_from_file() {
        let file = temp_file_with("x;y\n1;2\n".as_bytes());
        let table = read_flexible(file.path()).unwrap();
        assert_eq!(table.headers, vec!["x", "y"]);
    }

    #[test]
    fn test_read_flexible_missing_file() {
        let result = read_flexible(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(IngestError::Unreadable { .. })));
    }
}
