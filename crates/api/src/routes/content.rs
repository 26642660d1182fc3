//! Route definitions for free-form content posts.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

/// Content routes mounted at `/content`.
///
/// ```text
/// GET    /           -> list_content (?stream=5,7&limit=…)
/// DELETE /{id}       -> delete_content
/// GET    /{id}/blob  -> content_blob
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list_content))
        .route("/{id}", delete(content::delete_content))
        .route("/{id}/blob", get(content::content_blob))
}
