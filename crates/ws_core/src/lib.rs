pub mod browser;
pub mod config;
pub mod error;
pub mod storage;
pub mod text;
pub mod types;

pub use browser::{Locator, Node, PageDriver};
pub use config::{RunConfig, Timeouts, WebsiteConfig};
pub use error::Error;
pub use storage::{ArticleHandle, ArticleStore, StoredArticle, StoredImage};
pub use types::{ArticleInfo, Categories, Category, ImageRecord, PostTime};

pub type Result<T> = std::result::Result<T, Error>;
