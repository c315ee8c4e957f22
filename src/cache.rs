//! Time-bounded memo of the last loaded dataset.
//!
//! The loader is stateless and always reads from disk; callers that query
//! repeatedly keep a [`DatasetCache`] next to it. The cache holds a single
//! entry (there is only one data directory per configuration) and rebuilds
//! it once it is older than the TTL or after [`DatasetCache::invalidate`].

use crate::config::IngestConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::LoadReport;
use crate::processor::DatasetLoader;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedLoad {
    dataset: Arc<Dataset>,
    report: Arc<LoadReport>,
    built_at: Instant,
}

/// Single-entry dataset cache with a fixed time-to-live
#[derive(Debug)]
pub struct DatasetCache {
    ttl: Duration,
    entry: Option<CachedLoad>,
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Cache whose lifetime is `cache_ttl_secs` from the configuration
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.cache_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a cached dataset younger than the TTL is available
    pub fn is_fresh(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| entry.built_at.elapsed() < self.ttl)
    }

    /// Age of the cached dataset, if any
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|entry| entry.built_at.elapsed())
    }

    /// Return the cached dataset, rebuilding it with `load` when stale.
    ///
    /// A failed rebuild leaves the cache empty and returns the error.
    pub fn get_or_load<F>(&mut self, load: F) -> Result<(Arc<Dataset>, Arc<LoadReport>)>
    where
        F: FnOnce() -> Result<(Dataset, LoadReport)>,
    {
        if let Some(entry) = self.entry.as_ref().filter(|_| self.is_fresh()) {
            debug!(
                "Using cached dataset ({}s old)",
                entry.built_at.elapsed().as_secs()
            );
            return Ok((Arc::clone(&entry.dataset), Arc::clone(&entry.report)));
        }

        self.entry = None;
        let (dataset, report) = load()?;
        let entry = CachedLoad {
            dataset: Arc::new(dataset),
            report: Arc::new(report),
            built_at: Instant::now(),
        };
        let result = (Arc::clone(&entry.dataset), Arc::clone(&entry.report));
        self.entry = Some(entry);

        Ok(result)
    }

    /// [`DatasetCache::get_or_load`] with a [`DatasetLoader`]
    pub fn get_or_load_with(
        &mut self,
        loader: &DatasetLoader,
    ) -> Result<(Arc<Dataset>, Arc<LoadReport>)> {
        self.get_or_load(|| loader.load())
    }

    /// Force a rebuild on the next access
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("Dataset cache invalidated");
        }
    }
}
