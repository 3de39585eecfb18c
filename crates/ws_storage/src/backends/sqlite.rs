use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ws_core::{ArticleHandle, ArticleInfo, ArticleStore, Error, PostTime, Result, StoredArticle, StoredImage};
use crate::StorageBackend;

const DEFAULT_DB_PATH: &str = "articles.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        website TEXT NOT NULL,
        language TEXT NOT NULL,
        category TEXT NOT NULL,
        title TEXT NOT NULL,
        post_time TEXT NOT NULL,
        content TEXT NOT NULL,
        extract_time TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        url TEXT NOT NULL,
        caption TEXT NOT NULL,
        extract_time TEXT NOT NULL,
        UNIQUE (article_id, url)
    )
    "#,
];

fn db_error(context: &str, e: sqlx::Error) -> Error {
    Error::Database(format!("{}: {}", context, e))
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn name() -> &'static str {
        "sqlite"
    }

    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the given path (default ./articles.db)"
    }

    async fn open(location: Option<&str>) -> Result<Self> {
        let db_path = PathBuf::from(location.unwrap_or(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn commit_article(&self, info: &ArticleInfo) -> Result<ArticleHandle> {
        let post_time = serde_json::to_string(&info.post_time)?;

        sqlx::query(
            r#"
            INSERT INTO articles
            (url, website, language, category, title, post_time, content, extract_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                website = excluded.website,
                language = excluded.language,
                category = excluded.category,
                title = excluded.title,
                post_time = excluded.post_time,
                content = excluded.content,
                extract_time = excluded.extract_time
            "#,
        )
        .bind(&info.url)
        .bind(&info.website)
        .bind(&info.language)
        .bind(&info.category)
        .bind(&info.title)
        .bind(post_time)
        .bind(&info.content)
        .bind(&info.extract_time)
        .execute(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to store article", e))?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM articles WHERE url = ?")
            .bind(&info.url)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to read article id", e))?;

        Ok(ArticleHandle(id))
    }

    async fn commit_image(
        &self,
        article: ArticleHandle,
        url: &str,
        caption: &str,
        extract_time: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO images (article_id, url, caption, extract_time)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(article_id, url) DO UPDATE SET
                caption = excluded.caption,
                extract_time = excluded.extract_time
            "#,
        )
        .bind(article.0)
        .bind(url)
        .bind(caption)
        .bind(extract_time)
        .execute(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to store image", e))?;

        Ok(())
    }

    async fn get_article(&self, url: &str) -> Result<Option<StoredArticle>> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get article", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let post_time: PostTime = serde_json::from_str(&row.get::<String, _>("post_time"))?;
        Ok(Some(StoredArticle {
            handle: ArticleHandle(row.get("id")),
            info: ArticleInfo {
                url: row.get("url"),
                website: row.get("website"),
                language: row.get("language"),
                category: row.get("category"),
                title: row.get("title"),
                post_time,
                content: row.get("content"),
                extract_time: row.get("extract_time"),
            },
        }))
    }

    async fn get_images(&self, article: ArticleHandle) -> Result<Vec<StoredImage>> {
        let rows = sqlx::query("SELECT url, caption, extract_time FROM images WHERE article_id = ? ORDER BY id")
            .bind(article.0)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get images", e))?;

        Ok(rows
            .into_iter()
            .map(|row| StoredImage {
                url: row.get("url"),
                caption: row.get("caption"),
                extract_time: row.get("extract_time"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn article(url: &str, post_time: PostTime) -> ArticleInfo {
        ArticleInfo {
            url: url.to_string(),
            website: "ips".to_string(),
            language: "en".to_string(),
            category: "World".to_string(),
            title: "Test Article".to_string(),
            post_time,
            content: "Test content".to_string(),
            extract_time: "2024-01-03 10:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert!(db_path.exists());

        let info = article(
            "http://example.com/a",
            PostTime::Display(vec!["Tuesday".to_string(), "January 2".to_string()]),
        );
        let handle = storage.commit_article(&info).await.unwrap();
        storage
            .commit_image(handle, "http://example.com/a.png", "A caption", "2024-01-03 10:00:01")
            .await
            .unwrap();

        let stored = storage.get_article("http://example.com/a").await.unwrap().unwrap();
        assert_eq!(stored.handle, handle);
        assert_eq!(stored.info, info);

        let images = storage.get_images(handle).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].caption, "A caption");
    }

    #[tokio::test]
    async fn test_recommit_keeps_handle() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db")).await.unwrap();

        let info = article("http://example.com/a", PostTime::Machine("2024-01-02".to_string()));
        let first = storage.commit_article(&info).await.unwrap();
        let second = storage.commit_article(&info).await.unwrap();
        assert_eq!(first, second);

        storage.commit_image(first, "http://example.com/a.png", "", "t1").await.unwrap();
        storage.commit_image(first, "http://example.com/a.png", "", "t2").await.unwrap();
        let images = storage.get_images(first).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].extract_time, "t2");
    }

    #[tokio::test]
    async fn test_image_for_unknown_article_fails() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db")).await.unwrap();
        let result = storage.commit_image(ArticleHandle(99), "http://example.com/a.png", "", "t").await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
