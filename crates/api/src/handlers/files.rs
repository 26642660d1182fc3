//! Handler serving stored department files.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use campusign_core::types::DbId;
use campusign_db::repositories::FileRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/departments/{dept}/files/{name}
///
/// The raw bytes of a stored file, served under its stored mime type. This
/// is the URL the composition engine substitutes into file-valued page
/// properties.
pub async fn fetch_file(
    State(state): State<AppState>,
    Path((department, name)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let file = FileRepo::find_by_name(&state.pool, department, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no file named '{name}'")))?;

    Ok(([(header::CONTENT_TYPE, file.mime_type)], file.data))
}
