use std::sync::Arc;
use ws_core::RunConfig;

/// Everything a component needs to know about the category being scraped.
#[derive(Debug, Clone)]
pub struct CategoryContext {
    pub run: Arc<RunConfig>,
    pub category: String,
    /// Listing page the category starts from
    pub base_url: String,
}

impl CategoryContext {
    pub fn new(run: Arc<RunConfig>, category: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            run,
            category: category.into(),
            base_url: base_url.into(),
        }
    }
}
