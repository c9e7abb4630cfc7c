use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use gallery_types::models::Image;

use crate::error::CatalogError;
use crate::source::CatalogSource;

pub const DEFAULT_PAGE_SIZE: u32 = 8;

/// Infinite-scroll state: pages fetched so far and the next page to ask for.
pub struct Paginator {
    source: Arc<dyn CatalogSource>,
    per_page: u32,
    pages: BTreeMap<u32, Vec<Image>>,
    /// `None` once a page came back empty
    next_page: Option<u32>,
}

impl Paginator {
    pub fn new(source: Arc<dyn CatalogSource>, per_page: u32) -> Self {
        Self {
            source,
            per_page: per_page.max(1),
            pages: BTreeMap::new(),
            next_page: Some(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, page: u32) -> Option<&[Image]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Fetch the next page. Returns the page number stored, or `None`
    /// without touching the source once the catalog is exhausted.
    pub async fn fetch_next_page(&mut self) -> Result<Option<u32>, CatalogError> {
        let Some(page) = self.next_page else {
            debug!("No further pages");
            return Ok(None);
        };

        let images = self.source.fetch_page(page, self.per_page).await?;
        if images.is_empty() {
            info!("Catalog exhausted after {} pages", page - 1);
            self.next_page = None;
        } else {
            debug!("Loaded page {} ({} images)", page, images.len());
            self.next_page = Some(page + 1);
        }
        self.pages.insert(page, images);
        Ok(Some(page))
    }

    /// Every image loaded so far, in page order.
    pub fn images(&self) -> Vec<Image> {
        self.pages.values().flatten().cloned().collect()
    }

    /// Loaded images whose photographer or description contains `query`,
    /// ignoring case. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<Image> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.images();
        }

        self.pages
            .values()
            .flatten()
            .filter(|img| {
                img.user.name.to_lowercase().contains(&needle)
                    || img
                        .alt_description
                        .as_deref()
                        .is_some_and(|alt| alt.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}
