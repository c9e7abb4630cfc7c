use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;

use gallery_types::api::{GalleryResponse, ImagePageResponse};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<GalleryResponse> {
    let pager = state.pager.lock().await;
    Json(GalleryResponse {
        images: pager.search(&query.q),
        pages_loaded: pager.pages_loaded(),
        has_next_page: pager.has_next_page(),
    })
}

pub async fn next_page(
    State(state): State<AppState>,
) -> Result<Json<ImagePageResponse>, StatusCode> {
    let mut pager = state.pager.lock().await;
    let page = pager.fetch_next_page().await.map_err(|e| {
        error!("Failed to fetch images: {}", e);
        StatusCode::BAD_GATEWAY
    })?;

    let images = page
        .and_then(|p| pager.page(p))
        .map(<[_]>::to_vec)
        .unwrap_or_default();

    Ok(Json(ImagePageResponse {
        page,
        images,
        has_next_page: pager.has_next_page(),
    }))
}
