//! Handlers for the page template listing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use campusign_core::template::PageTemplate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/templates
///
/// The wire listing the configuration form builds itself from.
pub async fn list_templates(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let templates: Vec<_> = state
        .engine
        .templates()
        .fetch_all()
        .iter()
        .map(PageTemplate::to_wire_json)
        .collect();

    Ok(Json(DataResponse { data: templates }))
}
