use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use gallery_interactions::IdentityError;
use gallery_types::api::{LoginRequest, SessionResponse};
use gallery_types::models::UserIdentity;

use crate::state::AppState;

fn session_response(identity: UserIdentity) -> SessionResponse {
    SessionResponse {
        logged_in: identity.is_logged_in(),
        user_id: identity.user_id,
        user_name: identity.user_name,
    }
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(session_response(state.identity.current()))
}

/// Log in, or rename when already logged in. The user id never changes.
pub async fn set_name(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = state.identity.clone();
    let updated = tokio::task::spawn_blocking(move || identity.set_user_name(&req.user_name))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| match e {
            IdentityError::EmptyName => StatusCode::BAD_REQUEST,
            other => {
                error!("Failed to save identity: {}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    Ok(Json(session_response(updated)))
}
