//! Application constants for indicator ingestion
//!
//! Canonical column names, file discovery rules and the defaults used by
//! the configuration layer.

// =============================================================================
// Canonical Columns
// =============================================================================

/// Canonical header text of the six mandatory columns, in file order
pub const CANONICAL_HEADERS: [&str; 6] = [
    "Código de entidad",
    "Descripción entidad",
    "Fecha del dato",
    "Código del dato",
    "Descripción del dato",
    "Valor",
];

/// Width entity codes are zero-padded to
pub const ENTITY_CODE_WIDTH: usize = 5;

/// Separator between entity code and description in entity labels
pub const ENTITY_LABEL_SEPARATOR: &str = " - ";

/// Label used for indicators whose description is empty
pub const EMPTY_LABEL_PLACEHOLDER: &str = "—";

// =============================================================================
// File Discovery
// =============================================================================

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Extensions recognized as delimited text (compared case-insensitively)
pub const DEFAULT_EXTENSIONS: &[&str] = &["csv", "txt", "tsv"];

/// File name prefixes of hidden files and editor lock files
/// (`~$book.csv` from Excel, `.~lock.book.csv#` from LibreOffice)
pub const LOCK_FILE_PREFIXES: &[&str] = &["~$", "."];

/// File name suffixes of editor backup artifacts
pub const TEMP_FILE_SUFFIXES: &[&str] = &["~", ".tmp", ".bak"];

// =============================================================================
// Preferences and Caching
// =============================================================================

/// Entity label substrings preferred as default selection
pub const DEFAULT_PREFERRED_ENTITIES: &[&str] = &["nación"];

/// Indicator codes preferred as default selection
pub const DEFAULT_PREFERRED_INDICATORS: &[&str] = &["R1"];

/// Indicator codes shown first on the KPI panel
pub const DEFAULT_PANEL_INDICATORS: &[&str] = &["R1", "R2", "R3", "R4", "R5"];

/// Maximum number of KPI rows preselected on the panel
pub const DEFAULT_PANEL_LIMIT: usize = 6;

/// Default lifetime of a cached dataset, in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Directory name under the user config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "indicator-ingest";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";
