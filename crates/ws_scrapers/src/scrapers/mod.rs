use ws_core::{Locator, WebsiteConfig};

pub mod ips;

pub use ips::IpsScraper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub name: &'static str,
    pub emoji: &'static str,
}

/// Where a listing page keeps its article links and its pagination control.
#[derive(Debug, Clone)]
pub struct ListingLayout {
    pub entry_links: Locator,
    pub previous_page: Locator,
}

/// Where an article page keeps its title, publish time and body.
#[derive(Debug, Clone)]
pub struct ArticleLayout {
    pub title: Locator,
    pub post_time: Locator,
    pub paragraphs: Locator,
}

/// Every selector a site scraper needs.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Category links of the main navigation
    pub menu: Locator,
    pub listing: ListingLayout,
    pub article: ArticleLayout,
    /// Images worth downloading, restricted to the article body
    pub images: Locator,
}

pub trait Scraper: Send + Sync {
    /// Returns metadata about the news source
    fn source_metadata(&self) -> SourceMetadata;

    /// Returns true if this scraper can handle the given URL
    fn can_handle(&self, url: &str) -> bool;

    /// Returns a list of CLI shorthand names for this scraper
    fn cli_names(&self) -> Vec<&str>;

    /// Default website configuration
    fn website(&self) -> WebsiteConfig;

    fn layout(&self) -> SiteLayout;
}

pub type ScraperFactory = fn() -> Box<dyn Scraper>;

fn ips() -> Box<dyn Scraper> {
    Box::new(IpsScraper::new())
}

pub fn get_scraper_factories() -> Vec<ScraperFactory> {
    vec![ips as ScraperFactory]
}

/// Common utilities for scrapers
pub mod utils {
    use std::collections::HashSet;
    use url::Url;
    use ws_core::{Locator, Result};

    /// Matches any hyperlink; used to tell that a page has rendered.
    pub fn any_link() -> Locator {
        Locator::css("a")
    }

    /// Resolves an `href` against the page it was found on.
    pub fn resolve_href(page_url: &str, href: &str) -> Result<String> {
        Ok(Url::parse(page_url)?.join(href.trim())?.to_string())
    }

    /// Removes duplicates, keeping the first occurrence of each URL.
    pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
    }
}
