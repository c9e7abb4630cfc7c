use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use gallery_types::models::Image;

use crate::error::CatalogError;
use crate::source::CatalogSource;

pub const DEFAULT_API_URL: &str = "https://api.unsplash.com";

/// Popular photos from the Unsplash API.
pub struct UnsplashCatalog {
    client: Client,
    api_url: String,
    access_key: String,
}

impl UnsplashCatalog {
    pub fn new(api_url: &str, access_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
        }
    }

    fn photos_url(&self) -> String {
        format!("{}/photos", self.api_url)
    }
}

#[async_trait]
impl CatalogSource for UnsplashCatalog {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<Image>, CatalogError> {
        debug!("Fetching Unsplash page {} ({} per page)", page, per_page);

        let resp = self
            .client
            .get(self.photos_url())
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("order_by", "popular".to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        Ok(resp.json::<Vec<Image>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let catalog = UnsplashCatalog::new("https://api.unsplash.com/", "key");
        assert_eq!(catalog.photos_url(), "https://api.unsplash.com/photos");
    }

    #[test]
    fn photo_payload_decodes() {
        let body = r#"[{
            "id": "LBI7cgq3pbM",
            "urls": {"raw": "r", "full": "f", "regular": "reg", "small": "sm", "thumb": "th"},
            "user": {"name": "Gilbert Kane", "profile_image": {"small": "s", "medium": "m"}},
            "alt_description": null,
            "likes": 12
        }]"#;
        let images: Vec<Image> = serde_json::from_str(body).unwrap();

        assert_eq!(images[0].urls.small, "sm");
        assert_eq!(images[0].user.profile_image.as_ref().unwrap().medium, "m");
        assert_eq!(images[0].likes, Some(12));
        assert!(images[0].alt_description.is_none());
    }
}
