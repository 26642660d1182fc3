//! Route definitions for content streams.

use axum::routing::get;
use axum::Router;

use crate::handlers::streams;
use crate::state::AppState;

/// Stream routes mounted at `/streams`.
///
/// ```text
/// GET  / -> list_streams
/// POST / -> create_stream
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(streams::list_streams).post(streams::create_stream))
}
