use axum::{Json, extract::State, http::StatusCode};
use tracing::error;

use gallery_interactions::Feed;
use gallery_types::api::FeedResponse;

use crate::state::AppState;

pub async fn get_feed(State(state): State<AppState>) -> Result<Json<FeedResponse>, StatusCode> {
    let mut feed = Feed::open(state.sync.clone());
    let items = feed.ready().await.map_err(|e| {
        error!("Failed to load feed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(FeedResponse { items }))
}
