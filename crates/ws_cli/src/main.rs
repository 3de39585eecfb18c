use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use ws_core::{Error, PageDriver, Result, WebsiteConfig};
use ws_scrapers::drivers::{available_drivers, ChromiumDriver, StaticPage};
use ws_scrapers::{handle_command, init_logging, RunOptions, ScraperArgs, ScraperManager};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage backend (memory, sqlite)
    #[arg(long, default_value = "memory")]
    storage: String,
    /// Database file for the sqlite backend
    #[arg(long)]
    database: Option<String>,
    /// Directory receiving one folder per article
    #[arg(long, default_value = "output")]
    output: PathBuf,
    /// Page driver (chromium, static)
    #[arg(long, default_value = "chromium")]
    driver: String,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
    /// One listing page per category and at most a few articles
    #[arg(long)]
    debug: bool,
    /// Maximum number of articles per category
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, short)]
    verbose: bool,
    /// JSON file overriding the scraper's website settings
    #[arg(long)]
    site_config: Option<PathBuf>,
    #[command(flatten)]
    args: ScraperArgs,
}

impl Cli {
    fn run_options(&self) -> Result<RunOptions> {
        let website = self
            .site_config
            .as_deref()
            .map(WebsiteConfig::from_file)
            .transpose()?;
        Ok(RunOptions {
            debug: self.debug,
            limit: self.limit,
            website,
            ..RunOptions::new(&self.output)
        })
    }
}

enum Driver {
    Static(Arc<StaticPage>),
    Chromium(Arc<ChromiumDriver>),
}

impl Driver {
    async fn open(name: &str, headless: bool) -> Result<Self> {
        match name {
            "static" => Ok(Driver::Static(Arc::new(StaticPage::new()))),
            "chromium" => Ok(Driver::Chromium(Arc::new(ChromiumDriver::launch(headless).await?))),
            other => Err(Error::Config(format!(
                "Unknown driver: {} (available: {})",
                other,
                available_drivers().join(", ")
            ))),
        }
    }

    fn page(&self) -> Arc<dyn PageDriver> {
        match self {
            Driver::Static(page) => page.clone(),
            Driver::Chromium(browser) => browser.clone(),
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            Driver::Static(_) => Ok(()),
            Driver::Chromium(browser) => browser.close().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.run_options()?;
    let storage = ws_storage::create_storage(&cli.storage, cli.database.as_deref()).await?;
    let driver = Driver::open(&cli.driver, !cli.headed).await?;
    info!("🦗 Using the {} driver, writing to {}", cli.driver, cli.output.display());

    let manager = ScraperManager::new(driver.page(), storage, options);
    let result = handle_command(cli.args, &manager).await;

    if let Err(e) = driver.close().await {
        tracing::warn!("Cannot close the browser: {}", e);
    }
    result
}
