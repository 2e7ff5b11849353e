// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use url::Url;

use crate::export::EXPORT_FILE_NAME;

pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/1rOCXlnzaxTv0-pPKHhgGuQ9MgvNCgcKq_UCrLK7B2Gs/export?format=csv";

/// Layout density; decides how many groups the top-N tables keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Compact,
    Comfortable,
}

impl Density {
    pub fn top_n(self) -> usize {
        match self {
            Density::Compact => 8,
            Density::Comfortable => 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_url: String,
    pub cache_ttl_secs: u64,
    /// `None` leaves the HTTP client's own default in place.
    pub request_timeout_secs: Option<u64>,
    pub density: Density,
    pub detail_expanded: bool,
    pub currency_symbol: String,
    pub export_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            cache_ttl_secs: 5,
            request_timeout_secs: None,
            density: Density::default(),
            detail_expanded: false,
            currency_symbol: "₹".to_string(),
            export_file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with the YAML file if one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.source_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("source_url must be http(s), got `{}`", url.scheme());
        }
        if self.export_file_name.trim().is_empty() {
            bail!("export_file_name must not be empty");
        }
        Ok(())
    }

    pub fn source_url(&self) -> Result<Url> {
        Url::parse(&self.source_url).with_context(|| format!("invalid source_url `{}`", self.source_url))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
