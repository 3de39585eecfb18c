use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use crate::{Error, Result};

/// Articles processed per category in debug mode when no explicit limit is set.
pub const DEBUG_ARTICLE_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    /// Site root, also the entry point for category discovery
    pub url: String,
    /// Short code written into every record
    pub code: String,
    pub language: String,
}

impl WebsiteConfig {
    pub fn new(url: impl Into<String>, code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            code: code.into(),
            language: language.into(),
        }
    }

    /// Loads a website configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.origin()?;
        Ok(config)
    }

    /// `scheme://host[:port]` of the site, without a trailing slash.
    pub fn origin(&self) -> Result<String> {
        let url = Url::parse(&self.url)?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{} has no host", self.url)))?;
        Ok(match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        })
    }
}

/// Bounds for every wait the scraper performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Waiting for hyperlinks after loading the root or a listing page
    pub links: Duration,
    /// Waiting for images and blocks before a snapshot
    pub page_assets: Duration,
    /// Waiting for the "previous page" link
    pub pagination: Duration,
    /// Pause after following a pagination link
    pub settle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            links: Duration::from_secs(100),
            page_assets: Duration::from_secs(50),
            pagination: Duration::from_secs(150),
            settle: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub website: WebsiteConfig,
    pub output_path: PathBuf,
    /// One listing page per category, and a small article cap
    pub debug: bool,
    pub limit: Option<usize>,
    pub timeouts: Timeouts,
}

impl RunConfig {
    pub fn new(website: WebsiteConfig, output_path: impl Into<PathBuf>) -> Self {
        Self {
            website,
            output_path: output_path.into(),
            debug: false,
            limit: None,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The single cap on articles processed per category.
    pub fn article_limit(&self) -> Option<usize> {
        match self.limit {
            Some(limit) => Some(limit),
            None if self.debug => Some(DEBUG_ARTICLE_LIMIT),
            None => None,
        }
    }
}
