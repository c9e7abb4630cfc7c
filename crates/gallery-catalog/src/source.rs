use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use gallery_types::models::Image;

use crate::error::CatalogError;
use crate::mock::MockCatalog;
use crate::unsplash::UnsplashCatalog;

/// Where gallery pages come from. Pages are numbered from 1; an empty page
/// means there is nothing further.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<Image>, CatalogError>;
}

/// Serves from `primary`, answering from `fallback` whenever the primary fails.
pub struct FallbackCatalog {
    primary: Arc<dyn CatalogSource>,
    fallback: Arc<dyn CatalogSource>,
}

impl FallbackCatalog {
    pub fn new(primary: Arc<dyn CatalogSource>, fallback: Arc<dyn CatalogSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl CatalogSource for FallbackCatalog {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<Image>, CatalogError> {
        match self.primary.fetch_page(page, per_page).await {
            Ok(images) => Ok(images),
            Err(e) => {
                error!("Error fetching images (page {}): {}", page, e);
                self.fallback.fetch_page(page, per_page).await
            }
        }
    }
}

fn is_placeholder(key: &str) -> bool {
    key.trim().is_empty() || key.contains("your_unsplash")
}

/// Pick the catalog for the configured access key. Without a usable key the
/// gallery runs on mock data.
pub fn catalog_from_key(
    access_key: Option<&str>,
    api_url: &str,
    mock: MockCatalog,
) -> Arc<dyn CatalogSource> {
    match access_key {
        Some(key) if !is_placeholder(key) => {
            let unsplash = UnsplashCatalog::new(api_url, key);
            Arc::new(FallbackCatalog::new(Arc::new(unsplash), Arc::new(mock)))
        }
        _ => {
            warn!("Unsplash API key missing. Using mock data.");
            Arc::new(mock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl CatalogSource for Broken {
        async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<Vec<Image>, CatalogError> {
            Err(CatalogError::Status {
                status: 503,
                body: "down".into(),
            })
        }
    }

    #[tokio::test]
    async fn primary_failure_is_masked() {
        let catalog = FallbackCatalog::new(Arc::new(Broken), Arc::new(MockCatalog::new(7)));
        let images = catalog.fetch_page(2, 4).await.unwrap();

        assert_eq!(images.len(), 4);
        assert_eq!(images[0].id, "mock-2-0");
    }

    #[tokio::test]
    async fn placeholder_keys_select_the_mock() {
        for key in [None, Some(""), Some("your_unsplash_access_key")] {
            let catalog = catalog_from_key(key, "http://127.0.0.1:9", MockCatalog::new(1));
            let images = catalog.fetch_page(1, 2).await.unwrap();
            assert_eq!(images[0].id, "mock-1-0", "key {key:?}");
        }
    }

    #[test]
    fn real_looking_key_is_not_a_placeholder() {
        assert!(!is_placeholder("Zx81-abc"));
        assert!(is_placeholder("   "));
    }
}
