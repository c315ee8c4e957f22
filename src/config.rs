//! Configuration management and validation.
//!
//! Holds the data location, discovery rules, default-selection preferences
//! and cache lifetime. Values come from defaults, an optional TOML file and
//! finally command-line overrides.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CACHE_TTL_SECS, DEFAULT_DATA_DIR,
    DEFAULT_EXTENSIONS, DEFAULT_PANEL_INDICATORS, DEFAULT_PANEL_LIMIT, DEFAULT_PREFERRED_ENTITIES,
    DEFAULT_PREFERRED_INDICATORS,
};
use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Default-selection policy used to preselect an entity and an indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Substrings looked for in entity labels, in priority order
    /// (case- and accent-insensitive)
    pub entity_substrings: Vec<String>,

    /// Indicator codes, in priority order
    pub indicator_codes: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            entity_substrings: owned(DEFAULT_PREFERRED_ENTITIES),
            indicator_codes: owned(DEFAULT_PREFERRED_INDICATORS),
        }
    }
}

impl Preferences {
    /// Preferences that select nothing in particular
    pub fn none() -> Self {
        Self {
            entity_substrings: Vec::new(),
            indicator_codes: Vec::new(),
        }
    }
}

/// Global configuration for loading and querying indicator files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory scanned (non-recursively) for source files
    pub data_dir: PathBuf,

    /// Recognized file extensions, without the dot
    pub extensions: Vec<String>,

    /// Default entity/indicator selection
    pub preferences: Preferences,

    /// Indicator codes listed first on the KPI panel
    pub panel_indicator_codes: Vec<String>,

    /// Number of indicators preselected on the KPI panel
    pub panel_limit: usize,

    /// Lifetime of a cached dataset in seconds
    pub cache_ttl_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            extensions: owned(DEFAULT_EXTENSIONS),
            preferences: Preferences::default(),
            panel_indicator_codes: owned(DEFAULT_PANEL_INDICATORS),
            panel_limit: DEFAULT_PANEL_LIMIT,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl IngestConfig {
    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set recognized extensions
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Set default-selection preferences
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Set cache lifetime in seconds
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// `<user config dir>/indicator-ingest/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse a TOML config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| IngestError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` if given, else from the default location when a
    /// file exists there, else defaults. The result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(IngestError::configuration(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match Self::default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the loader cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(IngestError::configuration(
                "At least one file extension must be configured",
            ));
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.trim_start_matches('.').trim().is_empty())
        {
            return Err(IngestError::configuration(format!(
                "Invalid file extension: {:?}",
                bad
            )));
        }
        if self.panel_limit == 0 {
            return Err(IngestError::configuration("panel_limit must be at least 1"));
        }
        Ok(())
    }

    /// Whether `path` has one of the configured extensions (case-insensitive)
    pub fn accepts_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}
