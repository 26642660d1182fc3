//! Route definitions for the template listing.

use axum::routing::get;
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

/// Template routes mounted at `/templates`.
///
/// ```text
/// GET / -> list_templates
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(templates::list_templates))
}
