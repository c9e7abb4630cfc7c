use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gallery_types::models::{Image, ImageUrls, Photographer, ProfileImage};

use crate::error::CatalogError;
use crate::source::CatalogSource;

/// Generated placeholder images. The same seed always yields the same pages.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    seed: u64,
    page_limit: Option<u32>,
    latency: Duration,
}

impl MockCatalog {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            page_limit: None,
            latency: Duration::ZERO,
        }
    }

    /// Pages past `pages` come back empty.
    pub fn with_page_limit(mut self, pages: u32) -> Self {
        self.page_limit = Some(pages);
        self
    }

    /// Delay every page, like a slow network would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn image(&self, page: u32, index: u32) -> Image {
        let id = format!("mock-{}-{}", page, index);
        let mut rng = StdRng::seed_from_u64(
            self.seed ^ (u64::from(page) << 32) ^ u64::from(index).wrapping_mul(0x9e37_79b9),
        );

        Image {
            urls: ImageUrls {
                regular: format!("https://picsum.photos/seed/{}/600/800", id),
                small: format!("https://picsum.photos/seed/{}/400/600", id),
                thumb: format!("https://picsum.photos/seed/{}/200/300", id),
            },
            user: Photographer {
                name: format!("Photographer {}-{}", page, index),
                profile_image: Some(ProfileImage {
                    medium: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", id),
                }),
            },
            likes: Some(rng.random_range(0..1000)),
            alt_description: Some(format!("Mock image {}", id)),
            description: None,
            id,
        }
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<Image>, CatalogError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.page_limit.is_some_and(|limit| page > limit) {
            return Ok(Vec::new());
        }
        Ok((0..per_page).map(|i| self.image(page, i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pages_have_stable_distinct_ids() {
        let mock = MockCatalog::new(42);
        let page = mock.fetch_page(3, 8).await.unwrap();

        assert_eq!(page.len(), 8);
        assert_eq!(page[0].id, "mock-3-0");
        assert_eq!(page[7].id, "mock-3-7");
        assert_eq!(page[1].urls.thumb, "https://picsum.photos/seed/mock-3-1/200/300");
        assert_eq!(page[1].user.name, "Photographer 3-1");
        assert_eq!(page[1].alt_description.as_deref(), Some("Mock image mock-3-1"));
    }

    #[tokio::test]
    async fn same_seed_same_likes() {
        let a = MockCatalog::new(9).fetch_page(1, 5).await.unwrap();
        let b = MockCatalog::new(9).fetch_page(1, 5).await.unwrap();

        assert_eq!(a, b);
        assert!(a.iter().all(|img| img.likes.unwrap() < 1000));
    }

    #[tokio::test]
    async fn pages_past_the_limit_are_empty() {
        let mock = MockCatalog::new(0).with_page_limit(2);

        assert_eq!(mock.fetch_page(2, 4).await.unwrap().len(), 4);
        assert!(mock.fetch_page(3, 4).await.unwrap().is_empty());
    }
}
