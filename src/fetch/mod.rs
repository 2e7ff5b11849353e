// src/fetch/mod.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tracing::debug;
use url::Url;

/// Somewhere raw CSV bytes can be read from.
///
/// `id` is the cache key for whatever the source returns, so two sources
/// with the same id are assumed to serve the same table.
#[allow(async_fn_in_trait)]
pub trait CsvSource {
    fn id(&self) -> &str;
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// CSV export served over HTTP(S), e.g. a spreadsheet `export?format=csv` link.
pub struct HttpSource {
    client: Client,
    url: Url,
    id: String,
}

impl HttpSource {
    /// Without a timeout the transport default applies.
    pub fn new(url: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("building HTTP client")?;
        Ok(Self {
            client,
            id: url.to_string(),
            url,
        })
    }
}

impl CsvSource for HttpSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        debug!(url = %self.url, "fetching CSV export");
        let bytes = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", self.url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.url))?
            .bytes()
            .await
            .with_context(|| format!("Reading body from {}", self.url))?;
        Ok(bytes.to_vec())
    }
}

/// CSV file on local disk, re-read on every fetch.
pub struct FileSource {
    path: PathBuf,
    id: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: format!("file://{}", path.display()),
            path,
        }
    }
}

impl CsvSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))
    }
}

/// In-memory source. The body can be swapped or removed between fetches;
/// with no body every fetch fails.
pub struct MemorySource {
    id: String,
    body: Mutex<Option<Vec<u8>>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new(id: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            body: Mutex::new(Some(body.into())),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_body(&self, body: Option<Vec<u8>>) {
        if let Ok(mut guard) = self.body.lock() {
            *guard = body;
        }
    }

    /// Number of fetches attempted so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CsvSource for MemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let guard = self
            .body
            .lock()
            .map_err(|_| anyhow!("memory source lock poisoned"))?;
        guard
            .clone()
            .ok_or_else(|| anyhow!("source {} unavailable", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn memory_source_counts_fetches_and_fails_without_body() -> Result<()> {
        let src = MemorySource::new("mem", "a,b\n1,2\n");
        assert_eq!(src.fetch().await?, b"a,b\n1,2\n".to_vec());

        src.set_body(None);
        let err = src.fetch().await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert_eq!(src.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn file_source_reads_from_disk() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"Issue date,Item Name\n")?;
        let src = FileSource::new(tmp.path());
        assert!(src.id().starts_with("file://"));
        assert_eq!(src.fetch().await?, b"Issue date,Item Name\n".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn file_source_reports_missing_file() {
        let src = FileSource::new("/definitely/not/here.csv");
        let err = src.fetch().await.unwrap_err();
        assert!(format!("{:#}", err).contains("reading /definitely/not/here.csv"));
    }

    /// Hits the live export; run with `-- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn http_source_fetches_live_export() -> Result<()> {
        let url = Url::parse(crate::config::DEFAULT_SOURCE_URL)?;
        let src = HttpSource::new(url, Some(Duration::from_secs(30)))?;
        let body = src.fetch().await?;
        assert!(!body.is_empty());
        Ok(())
    }
}
