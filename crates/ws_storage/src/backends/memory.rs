use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use ws_core::{ArticleHandle, ArticleInfo, ArticleStore, Error, Result, StoredArticle, StoredImage};
use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    next_id: i64,
    articles: Vec<StoredArticle>,
    images: Vec<(ArticleHandle, StoredImage)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn commit_article(&mut self, info: &ArticleInfo) -> ArticleHandle {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.info.url == info.url) {
            existing.info = info.clone();
            return existing.handle;
        }
        let handle = ArticleHandle(self.next_id);
        self.next_id += 1;
        self.articles.push(StoredArticle {
            handle,
            info: info.clone(),
        });
        handle
    }

    pub fn commit_image(&mut self, article: ArticleHandle, image: StoredImage) -> Result<()> {
        if !self.articles.iter().any(|a| a.handle == article) {
            return Err(Error::Storage(format!("Unknown article handle: {}", article.0)));
        }
        match self
            .images
            .iter_mut()
            .find(|(handle, existing)| *handle == article && existing.url == image.url)
        {
            Some((_, existing)) => *existing = image,
            None => self.images.push((article, image)),
        }
        Ok(())
    }

    pub fn get_article(&self, url: &str) -> Option<StoredArticle> {
        self.articles.iter().find(|a| a.info.url == url).cloned()
    }

    pub fn get_images(&self, article: ArticleHandle) -> Vec<StoredImage> {
        self.images
            .iter()
            .filter(|(handle, _)| *handle == article)
            .map(|(_, image)| image.clone())
            .collect()
    }
}

pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn name() -> &'static str {
        "memory"
    }

    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_location: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn commit_article(&self, info: &ArticleInfo) -> Result<ArticleHandle> {
        let mut store = self.store.write().await;
        Ok(store.commit_article(info))
    }

    async fn commit_image(
        &self,
        article: ArticleHandle,
        url: &str,
        caption: &str,
        extract_time: &str,
    ) -> Result<()> {
        let mut store = self.store.write().await;
        store.commit_image(
            article,
            StoredImage {
                url: url.to_string(),
                caption: caption.to_string(),
                extract_time: extract_time.to_string(),
            },
        )
    }

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>> {
        let store = self.store.read().await;
        Ok(store.get_article(url))
    }

    async fn get_images(&self, article: ArticleHandle) -> Result<Vec<StoredImage>> {
        let store = self.store.read().await;
        Ok(store.get_images(article))
    }
}
