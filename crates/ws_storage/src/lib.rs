use async_trait::async_trait;
use std::sync::Arc;
use ws_core::{ArticleStore, Error, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStore + Sized {
    /// Name used on the command line
    fn name() -> &'static str;

    fn get_error_message() -> &'static str;

    /// Opens the backend; `location` is backend specific
    async fn open(location: Option<&str>) -> Result<Self>;
}

/// Storage kinds compiled into this build.
pub fn available_backends() -> Vec<&'static str> {
    let mut names = vec![MemoryStorage::name()];
    #[cfg(feature = "sqlite")]
    names.push(SQLiteStorage::name());
    names
}

async fn open_backend<T: StorageBackend + 'static>(location: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    match T::open(location).await {
        Ok(storage) => {
            tracing::info!("💾 Storage backend ready (using {})", T::name());
            Ok(Arc::new(storage))
        }
        Err(e) => {
            tracing::error!("{} ({})", T::get_error_message(), e);
            Err(e)
        }
    }
}

pub async fn create_storage(kind: &str, location: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => open_backend::<MemoryStorage>(location).await,
        #[cfg(feature = "sqlite")]
        "sqlite" => open_backend::<SQLiteStorage>(location).await,
        other => Err(Error::Config(format!(
            "Unknown storage backend: {} (available: {})",
            other,
            available_backends().join(", ")
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
