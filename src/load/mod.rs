// src/load/mod.rs

pub mod cache;
pub mod parse;

use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument};

use crate::fetch::CsvSource;
use crate::record::Dataset;
use cache::TtlCache;

pub use parse::{coerce_number, normalize_header, parse_dataset, parse_issue_date};

/// Outcome of a load. Never an `Err`: failures carry an empty dataset and
/// the message that should be shown to the user.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Arc<Dataset>,
    pub error: Option<String>,
}

impl Loaded {
    fn ok(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            dataset: Arc::new(Dataset::default()),
            error: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetches and parses the requisition log, caching the result per source id.
pub struct DataLoader<S> {
    source: S,
    cache: TtlCache<String, Loaded>,
}

impl<S: CsvSource> DataLoader<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and parse without touching the cache.
    pub async fn fetch_dataset(&self) -> Result<Dataset> {
        let bytes = self
            .source
            .fetch()
            .await
            .with_context(|| format!("fetching {}", self.source.id()))?;
        parse_dataset(&bytes).with_context(|| format!("parsing CSV from {}", self.source.id()))
    }

    /// Cached load. A failed load is cached too, so it is only retried once
    /// the entry expires or is invalidated.
    #[instrument(level = "info", skip(self), fields(source = %self.source.id()))]
    pub async fn load(&mut self) -> Loaded {
        if let Some(hit) = self.cache.get(self.source.id()) {
            info!(rows = hit.dataset.len(), "serving cached dataset");
            return hit;
        }

        let loaded = match self.fetch_dataset().await {
            Ok(ds) => {
                info!(rows = ds.len(), "loaded dataset");
                Loaded::ok(ds)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "load failed; continuing with empty dataset");
                Loaded::failed(format!("Error loading data: {:#}", e))
            }
        };
        self.cache
            .insert(self.source.id().to_string(), loaded.clone());
        loaded
    }

    /// Forget the cached dataset so the next `load` re-fetches.
    pub fn invalidate(&mut self) {
        if self.cache.invalidate(self.source.id()) {
            info!(source = %self.source.id(), "cache cleared");
        }
    }
}
