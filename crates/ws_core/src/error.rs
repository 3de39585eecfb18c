use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
