use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use ws_core::{ArticleStore, ImageRecord, Locator, Node, PageDriver, Result};
use crate::article::SavedArticle;
use crate::output::{ensure_dir, image_file_name, image_sidecar_name, write_json, IMAGES_DIR};

/// Counts of what happened to the images of one article.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageReport {
    pub saved: usize,
    /// Filtered out before any request was made
    pub skipped: usize,
    pub failed: usize,
}

/// An image that passed the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub caption: String,
}

/// Makes a site-relative `src` absolute against `origin` (`scheme://host[:port]`).
pub fn resolve_src(src: &str, origin: &str) -> String {
    if src.contains("https") || src.starts_with("http://") {
        return src.to_string();
    }
    if let Some(rest) = src.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }
    if src.starts_with('/') {
        format!("{}{}", origin, src)
    } else {
        format!("{}/{}", origin, src)
    }
}

/// Applies the download policy to an `<img>` node; `None` means skip it.
pub fn classify(node: &Node, origin: &str) -> Option<ImageCandidate> {
    let src = node.attribute("src").map(str::trim).filter(|s| !s.is_empty())?;
    let url = resolve_src(src, origin);
    if url.contains("cdn") {
        return None;
    }
    Some(ImageCandidate {
        url,
        caption: node.attribute("alt").unwrap_or_default().to_string(),
    })
}

/// File extension for a `Content-Type` header value.
pub fn extension_for(content_type: Option<&str>) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let subtype = mime.strip_prefix("image/").unwrap_or(&mime);

    let ext = match subtype {
        "jpeg" | "jpg" | "pjpeg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        "svg+xml" => "svg",
        "bmp" | "x-ms-bmp" => "bmp",
        "tiff" => "tiff",
        "x-icon" | "vnd.microsoft.icon" => "ico",
        "avif" => "avif",
        other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphanumeric()) => other,
        _ => "bin",
    };
    ext.to_string()
}

/// Downloads the images of an article, one at a time.
pub struct ImageDownloader {
    client: reqwest::Client,
}

impl ImageDownloader {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Saves every qualifying image under the article's `images/` directory,
    /// which is created with the first saved image.
    ///
    /// Files are numbered densely over saved images only. A failed download
    /// skips that image; a failed store write aborts the rest.
    pub async fn extract_images(
        &self,
        driver: &dyn PageDriver,
        images: &Locator,
        origin: &str,
        article: &SavedArticle,
        store: &dyn ArticleStore,
    ) -> Result<ImageReport> {
        let mut report = ImageReport::default();

        let nodes = match driver.find_all(images).await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!("Cannot find images: {}", e);
                return Ok(report);
            }
        };

        let dir = article.dir.join(IMAGES_DIR);
        for node in &nodes {
            let Some(candidate) = classify(node, origin) else {
                report.skipped += 1;
                continue;
            };

            let Some((bytes, ext)) = self.download(&candidate.url).await else {
                report.failed += 1;
                continue;
            };

            let index = report.saved;
            if index == 0 {
                ensure_dir(&dir).await?;
            }
            tokio::fs::write(dir.join(image_file_name(index, &ext)), &bytes).await?;
            let record = ImageRecord::for_article(&article.info, &candidate.url, &candidate.caption);
            write_json(&dir.join(image_sidecar_name(index)), &record).await?;
            store
                .commit_image(article.handle, &record.url, &record.caption, &record.extract_time)
                .await?;
            report.saved += 1;
        }

        tracing::debug!(
            "Images of {}: {} saved, {} skipped, {} failed",
            article.info.url,
            report.saved,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    async fn download(&self, url: &str) -> Option<(Vec<u8>, String)> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Cannot download image: {} error: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Cannot download image: {} status code: {}", url, status.as_u16());
            return None;
        }

        let ext = extension_for(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        match response.bytes().await {
            Ok(bytes) => Some((bytes.to_vec(), ext)),
            Err(e) => {
                tracing::warn!("Cannot download image: {} error: {}", url, e);
                None
            }
        }
    }
}

impl Default for ImageDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::StaticPage;
    use mockito::Server;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;
    use ws_core::{ArticleInfo, PostTime};
    use ws_storage::MemoryStorage;

    fn img(attrs: &[(&str, &str)]) -> Node {
        Node {
            text: String::new(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    async fn article(url: &str, dir: &Path, store: &MemoryStorage) -> SavedArticle {
        let info = ArticleInfo {
            url: url.to_string(),
            website: "ips".to_string(),
            language: "en".to_string(),
            category: "World".to_string(),
            title: "Floods".to_string(),
            post_time: PostTime::Machine("2024-01-02".to_string()),
            content: "Body".to_string(),
            extract_time: "2024-01-03 10:00:00".to_string(),
        };
        let handle = store.commit_article(&info).await.unwrap();
        SavedArticle {
            info,
            dir: dir.to_path_buf(),
            handle,
        }
    }

    #[test]
    fn test_resolve_src() {
        let origin = "https://ipsnews.net";
        assert_eq!(resolve_src("/wp/a.jpg", origin), "https://ipsnews.net/wp/a.jpg");
        assert_eq!(resolve_src("wp/a.jpg", origin), "https://ipsnews.net/wp/a.jpg");
        assert_eq!(resolve_src("//img.example.org/a.jpg", origin), "https://img.example.org/a.jpg");
        assert_eq!(resolve_src("https://x.org/a.jpg", origin), "https://x.org/a.jpg");
        assert_eq!(resolve_src("http://x.org/a.jpg", origin), "http://x.org/a.jpg");
    }

    #[test]
    fn test_classify() {
        let origin = "https://ipsnews.net";

        let kept = classify(&img(&[("src", "/a.jpg"), ("alt", "Flooded street")]), origin).unwrap();
        assert_eq!(kept.url, "https://ipsnews.net/a.jpg");
        assert_eq!(kept.caption, "Flooded street");

        let no_alt = classify(&img(&[("src", "/a.jpg")]), origin).unwrap();
        assert_eq!(no_alt.caption, "");

        assert!(classify(&img(&[("alt", "x")]), origin).is_none());
        assert!(classify(&img(&[("src", "  ")]), origin).is_none());
        assert!(classify(&img(&[("src", "https://cdn.example.com/a.jpg")]), origin).is_none());
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("image/png; charset=binary")), "png");
        assert_eq!(extension_for(Some("image/svg+xml")), "svg");
        assert_eq!(extension_for(Some("image/x-icon")), "ico");
        assert_eq!(extension_for(Some("image/heic")), "heic");
        assert_eq!(extension_for(Some("application/octet-stream")), "bin");
        assert_eq!(extension_for(None), "bin");
    }

    #[tokio::test]
    async fn test_dense_index_over_saved_images() {
        let mut server = Server::new_async().await;
        let a = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"png-bytes")
            .create_async()
            .await;
        let b = server.mock("GET", "/b.jpg").with_status(404).create_async().await;
        let c = server
            .mock("GET", "/c.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(b"jpeg-bytes")
            .create_async()
            .await;

        let html = r#"
            <div class="entry-thumbnail"><img src="/a.png" alt="First"></div>
            <div class="wp-caption alignright">
                <img src="https://cdn.example.com/x.jpg">
                <img alt="no source">
                <img src="/b.jpg">
                <img src="/c.jpg" alt="Third">
            </div>
            <div class="sidebar"><img src="/ad.png"></div>
        "#;
        let driver = StaticPage::from_html(&format!("{}/story/", server.url()), html);
        let images = Locator::css("div.entry-thumbnail img, div.wp-caption.alignright img");
        let store = MemoryStorage::new();
        let dir = tempdir().unwrap();
        let saved = article(&format!("{}/story/", server.url()), dir.path(), &store).await;

        let report = ImageDownloader::new()
            .extract_images(&driver, &images, &server.url(), &saved, &store)
            .await
            .unwrap();
        assert_eq!(report, ImageReport { saved: 2, skipped: 2, failed: 1 });

        let images_dir = dir.path().join(IMAGES_DIR);
        assert_eq!(std::fs::read(images_dir.join("image0.png")).unwrap(), b"png-bytes");
        assert_eq!(std::fs::read(images_dir.join("image1.jpg")).unwrap(), b"jpeg-bytes");
        assert!(!images_dir.join("image2.json").exists());

        let sidecar: ImageRecord =
            serde_json::from_str(&std::fs::read_to_string(images_dir.join("image1.json")).unwrap())
                .unwrap();
        assert_eq!(sidecar.url, format!("{}/c.jpg", server.url()));
        assert_eq!(sidecar.caption, "Third");
        assert_eq!(sidecar.article_url, saved.info.url);
        assert_eq!(sidecar.title, "Floods");

        let stored = store.get_images(saved.handle).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].caption, "First");

        a.assert_async().await;
        b.assert_async().await;
        c.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_host_skips_image() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/ok.gif")
            .with_status(200)
            .with_header("content-type", "image/gif")
            .with_body(b"gif-bytes")
            .create_async()
            .await;

        let html = r#"
            <div class="entry-thumbnail">
                <img src="http://127.0.0.1:1/refused.jpg" alt="Unreachable">
                <img src="/ok.gif" alt="Reachable">
            </div>
        "#;
        let driver = StaticPage::from_html(&format!("{}/story/", server.url()), html);
        let images = Locator::css("div.entry-thumbnail img");
        let store = MemoryStorage::new();
        let dir = tempdir().unwrap();
        let saved = article(&format!("{}/story/", server.url()), dir.path(), &store).await;

        let report = ImageDownloader::new()
            .extract_images(&driver, &images, &server.url(), &saved, &store)
            .await
            .unwrap();
        assert_eq!(report, ImageReport { saved: 1, skipped: 0, failed: 1 });

        let images_dir = dir.path().join(IMAGES_DIR);
        assert_eq!(std::fs::read(images_dir.join("image0.gif")).unwrap(), b"gif-bytes");
        let sidecar: ImageRecord =
            serde_json::from_str(&std::fs::read_to_string(images_dir.join("image0.json")).unwrap())
                .unwrap();
        assert_eq!(sidecar.caption, "Reachable");
        assert!(!images_dir.join("image1.json").exists());
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_kept_image_leaves_no_directory() {
        let mut server = Server::new_async().await;
        let gone = server.mock("GET", "/gone.png").with_status(404).create_async().await;

        let html = r#"
            <div class="wp-caption alignright">
                <img src="https://cdn.example.com/a.jpg">
                <img alt="no source">
                <img src="/gone.png">
            </div>
        "#;
        let driver = StaticPage::from_html(&format!("{}/story/", server.url()), html);
        let images = Locator::css("div.wp-caption.alignright img");
        let store = MemoryStorage::new();
        let dir = tempdir().unwrap();
        let saved = article(&format!("{}/story/", server.url()), dir.path(), &store).await;

        let report = ImageDownloader::new()
            .extract_images(&driver, &images, &server.url(), &saved, &store)
            .await
            .unwrap();
        assert_eq!(report, ImageReport { saved: 0, skipped: 2, failed: 1 });
        assert!(!dir.path().join(IMAGES_DIR).exists());
        gone.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_container_yields_no_images() {
        let driver = StaticPage::from_html("https://ipsnews.net/story/", "<p>No images</p>");
        let images = Locator::css(".entry-content").within("img");
        let store = MemoryStorage::new();
        let dir = tempdir().unwrap();
        let saved = article("https://ipsnews.net/story/", dir.path(), &store).await;

        let report = ImageDownloader::new()
            .extract_images(&driver, &images, "https://ipsnews.net", &saved, &store)
            .await
            .unwrap();
        assert_eq!(report, ImageReport::default());
        assert!(store.get_images(saved.handle).await.unwrap().is_empty());
        assert!(!dir.path().join(IMAGES_DIR).exists());
    }
}
