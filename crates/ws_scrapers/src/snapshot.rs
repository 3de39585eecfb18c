use std::path::{Path, PathBuf};
use ws_core::{Locator, PageDriver, Result, Timeouts};
use crate::output::ARTICLE_SNAPSHOT;

/// Gives lazily loaded content a chance to appear before the page is captured.
///
/// Every step is best effort: a timeout or driver error is logged and the
/// next step still runs.
pub async fn prepare_page(driver: &dyn PageDriver, timeouts: &Timeouts) {
    for selector in ["img", "div"] {
        if let Err(e) = driver.wait_for(&Locator::css(selector), timeouts.page_assets).await {
            tracing::warn!("Page has no {} elements yet: {}", selector, e);
        }
    }

    if let Err(e) = driver.scroll_to_bottom().await {
        tracing::warn!("Cannot scroll to the bottom: {}", e);
    }
}

pub async fn write_snapshot(article_dir: &Path, data: &str) -> Result<PathBuf> {
    let path = article_dir.join(ARTICLE_SNAPSHOT);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::StaticPage;
    use std::time::Duration;
    use tempfile::tempdir;

    fn quick() -> Timeouts {
        Timeouts {
            page_assets: Duration::from_millis(20),
            ..Timeouts::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_page_tolerates_missing_assets() {
        let driver = StaticPage::from_html("https://ipsnews.net/story/", "<p>text only</p>");
        prepare_page(&driver, &quick()).await;

        let data = driver.capture_snapshot().await.unwrap();
        assert!(data.contains("<p>text only</p>"));
    }

    #[tokio::test]
    async fn test_write_snapshot() {
        let dir = tempdir().unwrap();
        let driver = StaticPage::from_html("https://ipsnews.net/story/", "<div><img src=\"/a.png\"></div>");
        prepare_page(&driver, &quick()).await;

        let data = driver.capture_snapshot().await.unwrap();
        let path = write_snapshot(dir.path(), &data).await.unwrap();
        assert_eq!(path, dir.path().join(ARTICLE_SNAPSHOT));
        assert_eq!(std::fs::read_to_string(path).unwrap(), data);
    }
}
