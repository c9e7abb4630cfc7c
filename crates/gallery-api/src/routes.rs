use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::middleware::require_session;
use crate::state::AppState;
use crate::{feed, images, interactions, session};

/// HTTP routes. The WebSocket gateway is mounted by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/session", get(session::get_session).post(session::set_name))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/session/name", put(session::set_name))
        .route("/images", get(images::list_images))
        .route("/images/next", post(images::next_page))
        .route("/images/{image_id}/interactions", get(interactions::get_interactions))
        .route("/images/{image_id}/reactions", post(interactions::add_reaction))
        .route("/images/{image_id}/comments", post(interactions::add_comment))
        .route(
            "/images/{image_id}/comments/{comment_id}",
            delete(interactions::delete_comment),
        )
        .route("/feed", get(feed::get_feed))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
