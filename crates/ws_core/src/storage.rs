use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::types::ArticleInfo;
use crate::Result;

/// Identifier of a committed article, used to attach its images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleHandle(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArticle {
    pub handle: ArticleHandle,
    pub info: ArticleInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub caption: String,
    pub extract_time: String,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Store an article, replacing any previous record with the same URL
    async fn commit_article(&self, info: &ArticleInfo) -> Result<ArticleHandle>;

    /// Store an image belonging to a committed article
    async fn commit_image(
        &self,
        article: ArticleHandle,
        url: &str,
        caption: &str,
        extract_time: &str,
    ) -> Result<()>;

    /// Look up an article by URL
    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>>;

    /// All images of an article, in commit order
    async fn get_images(&self, article: ArticleHandle) -> Result<Vec<StoredImage>>;
}
