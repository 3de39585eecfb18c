use chrono::Local;
use serde::{Deserialize, Serialize};

/// Format used for every `extract_time` field.
pub const EXTRACT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time formatted as an extraction timestamp.
pub fn extract_timestamp() -> String {
    Local::now().format(EXTRACT_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub url: String,
}

/// Category label to listing URL, in menu order.
///
/// Inserting a label that already exists replaces its URL but keeps the
/// position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories {
    entries: Vec<Category>,
}

impl Categories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, url: impl Into<String>) {
        let label = label.into();
        let url = url.into();
        match self.entries.iter_mut().find(|c| c.label == label) {
            Some(existing) => existing.url = url,
            None => self.entries.push(Category { label, url }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter()
    }

    /// Keeps only the categories whose label is in `labels`.
    pub fn retain_labels(&mut self, labels: &[String]) {
        self.entries.retain(|c| labels.iter().any(|l| l == &c.label));
    }
}

impl IntoIterator for Categories {
    type Item = Category;
    type IntoIter = std::vec::IntoIter<Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Publish time as found on the page.
///
/// `Machine` holds a `datetime` attribute verbatim; `Display` holds the
/// visible text split on `", "` when no attribute exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostTime {
    Machine(String),
    Display(Vec<String>),
}

impl PostTime {
    pub fn from_display_text(text: &str) -> Self {
        PostTime::Display(text.trim().split(", ").map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleInfo {
    pub url: String,
    pub website: String,
    pub language: String,
    pub category: String,
    pub title: String,
    pub post_time: PostTime,
    pub content: String,
    pub extract_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub website: String,
    pub language: String,
    pub category: String,
    pub title: String,
    pub post_time: PostTime,
    pub article_url: String,
    pub caption: String,
    pub url: String,
    pub extract_time: String,
}

impl ImageRecord {
    /// Builds the record for an image of `article`, copying its metadata by value.
    pub fn for_article(article: &ArticleInfo, url: &str, caption: &str) -> Self {
        Self {
            website: article.website.clone(),
            language: article.language.clone(),
            category: article.category.clone(),
            title: article.title.clone(),
            post_time: article.post_time.clone(),
            article_url: article.url.clone(),
            caption: caption.to_string(),
            url: url.to_string(),
            extract_time: extract_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_last_label_wins() {
        let mut categories = Categories::new();
        categories.insert("World", "https://site/world/");
        categories.insert("Africa", "https://site/africa/");
        categories.insert("World", "https://site/world-news/");

        assert_eq!(categories.len(), 2);
        assert_eq!(categories.get("World"), Some("https://site/world-news/"));
        let labels: Vec<_> = categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["World", "Africa"]);
    }

    #[test]
    fn test_post_time_serializes_untagged() {
        let machine = PostTime::Machine("2024-01-02T03:04:05+00:00".to_string());
        assert_eq!(
            serde_json::to_string(&machine).unwrap(),
            r#""2024-01-02T03:04:05+00:00""#
        );

        let display = PostTime::from_display_text(" Tuesday, January 2, 2024 ");
        assert_eq!(
            display,
            PostTime::Display(vec![
                "Tuesday".to_string(),
                "January 2".to_string(),
                "2024".to_string()
            ])
        );
        assert_eq!(
            serde_json::to_string(&display).unwrap(),
            r#"["Tuesday","January 2","2024"]"#
        );
    }

    #[test]
    fn test_extract_timestamp_format() {
        let stamp = extract_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, EXTRACT_TIME_FORMAT).is_ok());
    }
}
