//! File discovery for indicator data directories
//!
//! Lists candidate source files directly inside the data directory
//! (no recursion) in lexicographic file-name order, so every load of the
//! same directory sees files in the same order.

use crate::config::IngestConfig;
use crate::constants::{LOCK_FILE_PREFIXES, TEMP_FILE_SUFFIXES};
use crate::error::{IngestError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File discovery component for a data directory
#[derive(Debug)]
pub struct FileDiscovery {
    data_dir: PathBuf,
    config: IngestConfig,
    ignored_count: usize,
}

impl FileDiscovery {
    /// Create a discovery over `config.data_dir` with its extensions
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            config: config.clone(),
            ignored_count: 0,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Regular files passed over during the last discovery
    pub fn ignored_count(&self) -> usize {
        self.ignored_count
    }

    /// Discover candidate source files.
    ///
    /// A missing directory yields no files; a directory that exists but
    /// cannot be listed is an error.
    pub fn discover_files(&mut self) -> Result<Vec<PathBuf>> {
        self.ignored_count = 0;

        if !self.data_dir.exists() {
            warn!(
                "Data directory {} does not exist, nothing to load",
                self.data_dir.display()
            );
            return Ok(Vec::new());
        }

        debug!("Searching for data files in: {}", self.data_dir.display());

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|source| IngestError::Discovery {
                path: self.data_dir.clone(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.is_candidate(path) {
                files.push(path.to_path_buf());
            } else {
                debug!("Ignoring {}", path.display());
                self.ignored_count += 1;
            }
        }

        debug!(
            "Found {} data files ({} ignored)",
            files.len(),
            self.ignored_count
        );

        Ok(files)
    }

    /// Recognized extension and not an editor lock or temp file
    fn is_candidate(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        !is_lock_or_temp(name) && self.config.accepts_extension(path)
    }
}

/// `~$book.csv`, `.~lock.book.csv#`, `book.csv~`, `book.csv.tmp` and friends
pub fn is_lock_or_temp(file_name: &str) -> bool {
    LOCK_FILE_PREFIXES
        .iter()
        .any(|prefix| file_name.starts_with(prefix))
        || TEMP_FILE_SUFFIXES
            .iter()
            .any(|suffix| file_name.ends_with(suffix))
}
