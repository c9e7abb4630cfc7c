use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error};
use uuid::Uuid;

use gallery_interactions::{ImageInteractions, InteractionError};
use gallery_types::api::{AddCommentRequest, AddReactionRequest, ImageInteractionsResponse};

use crate::state::AppState;

fn status_for(e: InteractionError) -> StatusCode {
    match e {
        InteractionError::NotLoggedIn => StatusCode::UNAUTHORIZED,
        InteractionError::EmptyEmoji | InteractionError::EmptyComment => StatusCode::BAD_REQUEST,
        InteractionError::Unavailable(reason) => {
            error!("Sync service unavailable: {}", reason);
            StatusCode::SERVICE_UNAVAILABLE
        }
        InteractionError::Sync(e) => {
            error!("Sync error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn open(state: &AppState, image_id: String) -> ImageInteractions {
    ImageInteractions::open(state.sync.clone(), state.identity.clone(), image_id)
}

pub async fn get_interactions(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let mut image = open(&state, image_id);
    image.ready().await.map_err(status_for)?;

    Ok(Json(ImageInteractionsResponse {
        image_id: image.image_id().to_string(),
        reactions: image.reactions(),
        comments: image.comments(),
        summary: image.summary(),
        my_reaction: image.my_reaction().map(|r| r.emoji),
    }))
}

pub async fn add_reaction(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
    Json(req): Json<AddReactionRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let mut image = open(&state, image_id);
    let outcome = image
        .add_reaction(&req.emoji, &req.image_url)
        .await
        .map_err(status_for)?;

    Ok(Json(outcome))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let mut image = open(&state, image_id);
    let comment = image
        .add_comment(&req.text, &req.image_url)
        .await
        .map_err(status_for)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Only the author may delete; anyone else gets 403.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((image_id, comment_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, StatusCode> {
    let mut image = open(&state, image_id);
    let loaded = image.ready().await.map_err(status_for)?;

    let comment = loaded
        .comments
        .iter()
        .find(|c| c.id == comment_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if !image.can_delete(comment) {
        debug!("Refusing to delete comment {} by {}", comment.id, comment.user_name);
        return Err(StatusCode::FORBIDDEN);
    }

    image.delete_comment(comment_id).await.map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}
