use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use crate::{Error, Result};

/// How often `wait_for` re-checks the page.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A chain of CSS selectors.
///
/// Every step but the last narrows the scope to the first element it matches
/// inside the previous scope; the last step selects all matches in that scope.
/// A missing intermediate element is an `ElementNotFound` error, an empty last
/// step is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<String>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            steps: vec![selector.into()],
        }
    }

    /// Scopes the following step inside the first match of the current one.
    pub fn within(mut self, selector: impl Into<String>) -> Self {
        self.steps.push(selector.into());
        self
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps.join(" >> "))
    }
}

/// Text and attributes of a located element, detached from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Node {
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl Node {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Element lookup and page control, implemented once per automation backend.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// URL of the loaded page, after redirects
    async fn current_url(&self) -> Result<String>;

    /// All elements matching the locator
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Node>>;

    /// Scroll to the bottom of the page so lazy content loads
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Full-page MHTML snapshot of the loaded page
    async fn capture_snapshot(&self) -> Result<String>;

    /// First element matching the locator
    async fn find(&self, locator: &Locator) -> Result<Node> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(locator.to_string()))
    }

    /// Waits until at least one element matches the locator.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                match self.find_all(locator).await {
                    Ok(nodes) if !nodes.is_empty() => return,
                    _ => tokio::time::sleep(WAIT_POLL_INTERVAL).await,
                }
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            Error::Timeout(format!("waiting {:?} for {}", timeout, locator))
        })
    }
}
