pub mod article;
pub mod categories;
pub mod cli;
pub mod context;
pub mod drivers;
pub mod images;
pub mod logging;
pub mod manager;
pub mod output;
pub mod pagination;
pub mod scrapers;
pub mod snapshot;

pub use manager::{ArticleOutcome, RunOptions, RunSummary, ScraperManager};

pub use cli::{ScraperArgs, ScraperCommands, handle_command};
pub use logging::{init_logging, Logger};
pub use scrapers::Scraper;

pub mod prelude {
    pub use super::scrapers::Scraper;
    pub use super::drivers::StaticPage;
    pub use super::manager::{RunOptions, ScraperManager};
    pub use ws_core::{ArticleInfo, Error, PageDriver, Result};
}
