use clap::{Args, Subcommand};
use ws_core::Result;
use crate::manager::{ArticleOutcome, ScraperManager};

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Scrape every category of a source (e.g. ips)
    Scrape {
        source: String,
        /// Only scrape the category with this menu label; repeatable
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Print the category menu of a source
    Categories {
        source: String,
    },
    /// Scrape a single article
    Url {
        url: String,
        /// Category recorded for the article
        #[arg(long, default_value = "")]
        category: String,
    },
    /// List available scrapers
    List,
}

pub async fn handle_command(args: ScraperArgs, manager: &ScraperManager) -> Result<()> {
    match args.command {
        ScraperCommands::Scrape { source, categories } => {
            let summary = manager.scrape_source(&source, &categories).await?;
            println!(
                "Scraped {} categories: {} of {} articles saved, {} images",
                summary.categories, summary.saved, summary.urls, summary.images
            );
        }
        ScraperCommands::Categories { source } => {
            let categories = manager.list_categories(&source).await?;
            for category in categories.iter() {
                println!("  {:<30} {}", category.label, category.url);
            }
        }
        ScraperCommands::Url { url, category } => match manager.scrape_url(&url, &category).await? {
            ArticleOutcome::Saved { dir, images } => {
                println!("🆕 {} ({} images) - {}", dir.display(), images.saved, url);
            }
            ArticleOutcome::Incomplete { dir, error } => {
                println!("⚠️ {} (incomplete: {}) - {}", dir.display(), error, url);
            }
            ArticleOutcome::Skipped => {
                println!("⏭️ Skipped {}", url);
            }
        },
        ScraperCommands::List => {
            println!("Available scrapers:");
            for scraper in manager.get_scrapers() {
                let meta = scraper.source_metadata();
                println!("  {} {} ({})", meta.emoji, meta.name, scraper.cli_names().join(", "));
            }
        }
    }
    Ok(())
}
