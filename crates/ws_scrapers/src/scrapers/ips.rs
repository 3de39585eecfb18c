use ws_core::{Locator, WebsiteConfig};
use crate::scrapers::{ArticleLayout, ListingLayout, Scraper, SiteLayout, SourceMetadata};

/// Inter Press Service news agency, a WordPress site.
#[derive(Debug, Clone, Default)]
pub struct IpsScraper;

impl IpsScraper {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://ipsnews.net";
}

impl Scraper for IpsScraper {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "IPS News",
            emoji: "🌍",
        }
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("ipsnews.net")
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["ips", "ipsnews"]
    }

    fn website(&self) -> WebsiteConfig {
        WebsiteConfig::new(Self::BASE_URL, "ips", "en")
    }

    fn layout(&self) -> SiteLayout {
        SiteLayout {
            menu: Locator::css("nav").within(".sf-menu").within("a"),
            listing: ListingLayout {
                entry_links: Locator::css(".site-content").within(".entry-title a"),
                previous_page: Locator::css(".nav-previous a, a.nav-previous"),
            },
            article: ArticleLayout {
                title: Locator::css("h1.entry-title"),
                post_time: Locator::css("time.entry-date.published.updated"),
                paragraphs: Locator::css("div.clearfix.entry-content").within("p"),
            },
            images: Locator::css("div.entry-thumbnail img, div.wp-caption.alignright img"),
        }
    }
}
