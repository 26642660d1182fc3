//! Route definitions for departments and the department-scoped resources
//! (displays, files, content posting, the composer's stream picker).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{content, departments, displays, files, streams};
use crate::state::AppState;

/// Department routes mounted at `/departments`.
///
/// ```text
/// GET  /                          -> list_departments
/// POST /                          -> create_department
/// GET  /{dept}/displays           -> list_displays
/// POST /{dept}/displays           -> compose_display
/// POST /{dept}/preview_display    -> preview_display
/// GET  /{dept}/files/{name}       -> fetch_file
/// POST /{dept}/content            -> post_content
/// GET  /{dept}/streams            -> composer_streams
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/{dept}/displays",
            get(displays::list_displays).post(displays::compose_display),
        )
        .route("/{dept}/preview_display", post(displays::preview_display))
        .route("/{dept}/files/{name}", get(files::fetch_file))
        .route("/{dept}/content", post(content::post_content))
        .route("/{dept}/streams", get(streams::composer_streams))
}
