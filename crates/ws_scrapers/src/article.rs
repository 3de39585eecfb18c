use std::path::{Path, PathBuf};
use ws_core::text::sanitize_str;
use ws_core::types::extract_timestamp;
use ws_core::{ArticleHandle, ArticleInfo, ArticleStore, PageDriver, PostTime, Result};
use crate::context::CategoryContext;
use crate::output::{article_dir, ensure_dir, write_json, ARTICLE_JSON};
use crate::scrapers::ArticleLayout;

/// An article written to disk and committed to the store.
#[derive(Debug, Clone)]
pub struct SavedArticle {
    pub info: ArticleInfo,
    pub dir: PathBuf,
    pub handle: ArticleHandle,
}

/// Reads the metadata of the article loaded in `driver`.
pub async fn extract_article_info(
    driver: &dyn PageDriver,
    layout: &ArticleLayout,
    ctx: &CategoryContext,
) -> Result<ArticleInfo> {
    let url = driver.current_url().await?;

    let title = driver.find(&layout.title).await?;

    let time = driver.find(&layout.post_time).await?;
    let post_time = match time.attribute("datetime") {
        Some(datetime) => PostTime::Machine(datetime.to_string()),
        None => PostTime::from_display_text(time.text()),
    };

    let mut content = String::new();
    for paragraph in driver.find_all(&layout.paragraphs).await? {
        content.push_str(paragraph.text());
        content.push('\n');
    }

    Ok(ArticleInfo {
        url,
        website: ctx.run.website.code.clone(),
        language: ctx.run.website.language.clone(),
        category: ctx.category.clone(),
        title: sanitize_str(title.text()),
        post_time,
        content: sanitize_str(&content),
        extract_time: extract_timestamp(),
    })
}

/// Writes `article.json` under the article's own directory and commits the record.
pub async fn save_article(
    info: ArticleInfo,
    output_root: &Path,
    store: &dyn ArticleStore,
) -> Result<SavedArticle> {
    let dir = article_dir(output_root, &info.title);
    ensure_dir(&dir).await?;
    write_json(&dir.join(ARTICLE_JSON), &info).await?;
    let handle = store.commit_article(&info).await?;
    Ok(SavedArticle { info, dir, handle })
}

/// Extracts and saves the loaded article; `None` when any step fails.
///
/// Files written before a failure are left in place.
pub async fn extract_article(
    driver: &dyn PageDriver,
    layout: &ArticleLayout,
    ctx: &CategoryContext,
    store: &dyn ArticleStore,
) -> Option<SavedArticle> {
    let saved = async {
        let info = extract_article_info(driver, layout, ctx).await?;
        save_article(info, &ctx.run.output_path, store).await
    };

    match saved.await {
        Ok(saved) => Some(saved),
        Err(e) => {
            tracing::warn!("Cannot extract article: {}", e);
            None
        }
    }
}
