use ws_core::{Error, PageDriver, Result, Timeouts};
use crate::scrapers::utils::{any_link, dedup_preserving_order, resolve_href};
use crate::scrapers::ListingLayout;

/// Outcome of trying to move to the next (older) listing page.
#[derive(Debug)]
pub enum PageTurn {
    /// The driver is now on this page
    More(String),
    NoMorePages,
    Failed(Error),
}

/// Walks a category's listing pages through "older posts" links.
pub struct UrlCollector<'a> {
    driver: &'a dyn PageDriver,
    layout: &'a ListingLayout,
    timeouts: Timeouts,
    single_page: bool,
}

impl<'a> UrlCollector<'a> {
    pub fn new(driver: &'a dyn PageDriver, layout: &'a ListingLayout, timeouts: Timeouts) -> Self {
        Self {
            driver,
            layout,
            timeouts,
            single_page: false,
        }
    }

    /// Stop after the first listing page.
    pub fn single_page(mut self, single_page: bool) -> Self {
        self.single_page = single_page;
        self
    }

    /// Article URLs reachable from `start_url`, first-seen order, no duplicates.
    ///
    /// Failing to load `start_url` is an error; anything that goes wrong
    /// afterwards ends the walk and keeps what was collected.
    pub async fn collect(&self, start_url: &str) -> Result<Vec<String>> {
        self.driver.goto(start_url).await?;
        self.driver.wait_for(&any_link(), self.timeouts.links).await?;

        let mut urls = Vec::new();
        let mut pages = 1;
        loop {
            match self.read_entries().await {
                Ok(mut found) => {
                    tracing::debug!("Listing page {} has {} entries", pages, found.len());
                    urls.append(&mut found);
                }
                Err(e) => {
                    tracing::warn!("Cannot read listing page {}: {}", pages, e);
                    break;
                }
            }

            if self.single_page {
                break;
            }

            match self.turn_page().await {
                PageTurn::More(url) => {
                    pages += 1;
                    tracing::debug!("Following older posts to {}", url);
                }
                PageTurn::NoMorePages => {
                    tracing::debug!("No older posts after page {}", pages);
                    break;
                }
                PageTurn::Failed(e) => {
                    tracing::warn!("Cannot load more: {}", e);
                    break;
                }
            }
        }

        Ok(dedup_preserving_order(urls))
    }

    async fn read_entries(&self) -> Result<Vec<String>> {
        let page_url = self.driver.current_url().await?;
        let links = self.driver.find_all(&self.layout.entry_links).await?;
        let urls = links
            .iter()
            .filter_map(|link| link.attribute("href"))
            .filter_map(|href| match resolve_href(&page_url, href) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!("Skipping entry link {:?}: {}", href, e);
                    None
                }
            })
            .collect();
        Ok(urls)
    }

    /// Follows the "previous page" link, if the page has one.
    pub async fn turn_page(&self) -> PageTurn {
        let previous = &self.layout.previous_page;
        if self.driver.wait_for(previous, self.timeouts.pagination).await.is_err() {
            return PageTurn::NoMorePages;
        }

        match self.follow(previous).await {
            Ok(url) => PageTurn::More(url),
            Err(e) => PageTurn::Failed(e),
        }
    }

    async fn follow(&self, previous: &ws_core::Locator) -> Result<String> {
        let link = self.driver.find(previous).await?;
        let href = link
            .attribute("href")
            .ok_or_else(|| Error::Scraping(format!("{} has no href", previous)))?;
        let next = resolve_href(&self.driver.current_url().await?, href)?;

        self.driver.goto(&next).await?;
        self.driver.wait_for(&any_link(), self.timeouts.links).await?;
        tokio::time::sleep(self.timeouts.settle).await;
        Ok(next)
    }
}
