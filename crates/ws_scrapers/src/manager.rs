use kdam::{tqdm, BarExt};
use std::path::PathBuf;
use std::sync::Arc;
use ws_core::{ArticleStore, Categories, Error, PageDriver, Result, RunConfig, Timeouts, WebsiteConfig};
use crate::article::extract_article;
use crate::categories::fetch_categories;
use crate::context::CategoryContext;
use crate::images::{ImageDownloader, ImageReport};
use crate::logging::Logger;
use crate::pagination::UrlCollector;
use crate::scrapers::{get_scraper_factories, Scraper, ScraperFactory, SiteLayout};
use crate::snapshot::{prepare_page, write_snapshot};

type BoxedScraper = Box<dyn Scraper>;

/// Settings shared by every scraper of a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_path: PathBuf,
    pub debug: bool,
    pub limit: Option<usize>,
    pub timeouts: Timeouts,
    /// Replaces the scraper's own website settings
    pub website: Option<WebsiteConfig>,
}

impl RunOptions {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            debug: false,
            limit: None,
            timeouts: Timeouts::default(),
            website: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    Saved { dir: PathBuf, images: ImageReport },
    /// `article.json` and the record exist, but the snapshot or the images failed
    Incomplete { dir: PathBuf, error: String },
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub categories: usize,
    pub urls: usize,
    /// Includes the incomplete ones
    pub saved: usize,
    pub incomplete: usize,
    pub skipped: usize,
    pub images: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &ArticleOutcome) {
        match outcome {
            ArticleOutcome::Saved { images, .. } => {
                self.saved += 1;
                self.images += images.saved;
            }
            ArticleOutcome::Incomplete { .. } => {
                self.saved += 1;
                self.incomplete += 1;
            }
            ArticleOutcome::Skipped => self.skipped += 1,
        }
    }
}

pub struct ScraperManager {
    driver: Arc<dyn PageDriver>,
    store: Arc<dyn ArticleStore>,
    options: RunOptions,
    factories: Vec<ScraperFactory>,
    images: ImageDownloader,
}

impl ScraperManager {
    pub fn new(driver: Arc<dyn PageDriver>, store: Arc<dyn ArticleStore>, options: RunOptions) -> Self {
        Self {
            driver,
            store,
            options,
            factories: get_scraper_factories(),
            images: ImageDownloader::new(),
        }
    }

    pub fn add_scraper_factory(&mut self, factory: ScraperFactory) {
        self.factories.push(factory);
    }

    pub fn get_scrapers(&self) -> Vec<BoxedScraper> {
        self.factories.iter().map(|f| f()).collect()
    }

    /// Looks a scraper up by one of its command-line names.
    pub fn get_scraper(&self, name: &str) -> Result<BoxedScraper> {
        let name = name.to_lowercase();
        self.get_scrapers()
            .into_iter()
            .find(|s| s.cli_names().iter().any(|n| n.to_lowercase() == name))
            .ok_or_else(|| Error::Scraping(format!("No scraper named {}", name)))
    }

    /// The scraper for `url`; a configured website override also claims its own URLs.
    pub fn get_scraper_for_url(&self, url: &str) -> Result<BoxedScraper> {
        let overridden = |scraper: &BoxedScraper| match &self.options.website {
            Some(site) => url.starts_with(&site.url) && scraper.website().code == site.code,
            None => false,
        };
        self.get_scrapers()
            .into_iter()
            .find(|s| s.can_handle(url) || overridden(s))
            .ok_or_else(|| Error::Scraping(format!("No scraper found for URL: {}", url)))
    }

    fn run_config(&self, scraper: &dyn Scraper) -> RunConfig {
        let website = self
            .options
            .website
            .clone()
            .unwrap_or_else(|| scraper.website());
        RunConfig::new(website, &self.options.output_path)
            .with_debug(self.options.debug)
            .with_limit(self.options.limit)
            .with_timeouts(self.options.timeouts)
    }

    fn logger(scraper: &dyn Scraper) -> Logger {
        let meta = scraper.source_metadata();
        Logger::new().with_prefix(meta.emoji).with_prefix(meta.name)
    }

    pub async fn list_categories(&self, name: &str) -> Result<Categories> {
        let scraper = self.get_scraper(name)?;
        let run = self.run_config(scraper.as_ref());
        fetch_categories(
            self.driver.as_ref(),
            &run.website.url,
            &scraper.layout().menu,
            &run.timeouts,
        )
        .await
    }

    /// Scrapes every category of a source, or only those labelled in `only`.
    pub async fn scrape_source(&self, name: &str, only: &[String]) -> Result<RunSummary> {
        let scraper = self.get_scraper(name)?;
        let logger = Self::logger(scraper.as_ref());
        let run = Arc::new(self.run_config(scraper.as_ref()));
        let layout = scraper.layout();

        let menu = fetch_categories(self.driver.as_ref(), &run.website.url, &layout.menu, &run.timeouts);
        let mut categories = match menu.await {
            Ok(categories) => categories,
            Err(e) => {
                logger.error(&format!("Cannot read the category menu of {}: {}", run.website.url, e));
                return Err(e);
            }
        };

        if !only.is_empty() {
            for label in only {
                if categories.get(label).is_none() {
                    logger.warn(&format!("Unknown category: {}", label));
                }
            }
            categories.retain_labels(only);
        }

        let mut summary = RunSummary::default();
        for category in categories.iter() {
            let ctx = CategoryContext::new(run.clone(), &category.label, &category.url);
            let logger = logger.clone().with_prefix(format!("[{}]", category.label));
            self.scrape_category(&layout, &ctx, &logger, &mut summary).await;
            summary.categories += 1;
        }

        logger.info(&format!(
            "✅ {} categories, {} articles saved ({} incomplete), {} skipped, {} images",
            summary.categories, summary.saved, summary.incomplete, summary.skipped, summary.images
        ));
        Ok(summary)
    }

    async fn scrape_category(
        &self,
        layout: &SiteLayout,
        ctx: &CategoryContext,
        logger: &Logger,
        summary: &mut RunSummary,
    ) {
        let collector = UrlCollector::new(self.driver.as_ref(), &layout.listing, ctx.run.timeouts)
            .single_page(ctx.run.debug);
        let mut urls = match collector.collect(&ctx.base_url).await {
            Ok(urls) => urls,
            Err(e) => {
                logger.warn(&format!("Cannot collect articles from {}: {}", ctx.base_url, e));
                return;
            }
        };

        if let Some(limit) = ctx.run.article_limit() {
            urls.truncate(limit);
        }
        logger.info(&format!("🔗 {} articles to download", urls.len()));
        summary.urls += urls.len();

        let mut bar = tqdm!(total = urls.len(), desc = ctx.category.clone());
        for url in &urls {
            let outcome = match self.download_article(layout, ctx, url).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    logger.warn(&format!("Cannot download article {}: {}", url, e));
                    ArticleOutcome::Skipped
                }
            };
            match &outcome {
                ArticleOutcome::Saved { dir, images } => {
                    logger.debug(&format!("📰 {} ({} images) -> {}", url, images.saved, dir.display()));
                }
                ArticleOutcome::Incomplete { dir, error } => {
                    logger.warn(&format!("Article {} saved to {} without all assets: {}", url, dir.display(), error));
                }
                ArticleOutcome::Skipped => {}
            }
            summary.record(&outcome);
            if let Err(e) = bar.update(1) {
                logger.debug(&format!("Progress bar error: {}", e));
            }
        }
    }

    /// Loads one article and writes all of its artifacts.
    pub async fn download_article(
        &self,
        layout: &SiteLayout,
        ctx: &CategoryContext,
        url: &str,
    ) -> Result<ArticleOutcome> {
        let driver = self.driver.as_ref();
        driver.goto(url).await?;
        prepare_page(driver, &ctx.run.timeouts).await;
        let snapshot = driver.capture_snapshot().await?;

        let Some(saved) = extract_article(driver, &layout.article, ctx, self.store.as_ref()).await else {
            return Ok(ArticleOutcome::Skipped);
        };

        let assets = async {
            write_snapshot(&saved.dir, &snapshot).await?;
            let origin = ctx.run.website.origin()?;
            self.images
                .extract_images(driver, &layout.images, &origin, &saved, self.store.as_ref())
                .await
        };
        match assets.await {
            Ok(images) => Ok(ArticleOutcome::Saved { dir: saved.dir, images }),
            Err(e) => Ok(ArticleOutcome::Incomplete {
                dir: saved.dir,
                error: e.to_string(),
            }),
        }
    }

    /// Downloads a single article, filed under `category`.
    pub async fn scrape_url(&self, url: &str, category: &str) -> Result<ArticleOutcome> {
        let scraper = self.get_scraper_for_url(url)?;
        let run = Arc::new(self.run_config(scraper.as_ref()));
        let ctx = CategoryContext::new(run, category, url);
        self.download_article(&scraper.layout(), &ctx, url).await
    }
}
