//! On-disk layout of a scraped article.

use serde::Serialize;
use std::path::{Path, PathBuf};
use ws_core::text::sanitize_filename;
use ws_core::Result;

pub const ARTICLE_JSON: &str = "article.json";
pub const ARTICLE_SNAPSHOT: &str = "article.mhtml";
pub const IMAGES_DIR: &str = "images";

/// Directory holding every artifact of the article titled `title`.
pub fn article_dir(output_root: &Path, title: &str) -> PathBuf {
    output_root.join(sanitize_filename(title))
}

pub fn image_file_name(index: usize, extension: &str) -> String {
    format!("image{}.{}", index, extension)
}

pub fn image_sidecar_name(index: usize) -> String {
    format!("image{}.json", index)
}

pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Writes `value` as indented JSON, non-ASCII text kept as is.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_names() {
        let dir = article_dir(Path::new("/out"), "Africa: Drought?");
        assert_eq!(dir, PathBuf::from("/out/Africa_ Drought_"));
        assert_eq!(image_file_name(0, "jpg"), "image0.jpg");
        assert_eq!(image_sidecar_name(3), "image3.json");
    }

    #[tokio::test]
    async fn test_write_json_keeps_unicode() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();

        let path = nested.join("value.json");
        write_json(&path, &serde_json::json!({"title": "Café à São Paulo"})).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Café à São Paulo"));
        assert!(written.contains("\n  \"title\""));
    }
}
