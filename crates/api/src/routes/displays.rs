//! Route definitions for rendered displays.

use axum::routing::get;
use axum::Router;

use crate::handlers::displays;
use crate::state::AppState;

/// Display routes mounted at `/displays`.
///
/// ```text
/// GET /{id} -> render_display (the playback document)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(displays::render_display))
}
