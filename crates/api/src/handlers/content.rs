//! Handlers for posting, listing and fetching free-form content.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use campusign_core::content::FreeFormContent;
use campusign_core::types::DbId;
use campusign_db::repositories::ContentRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_department_exists;
use crate::multipart::collect_form;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

/// POST /api/departments/{dept}/content
///
/// Post a piece of free-form content from a submitted form. The id and post
/// timestamp are assigned by the insert, never by the submission.
pub async fn post_content(
    State(state): State<AppState>,
    Path(department): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    ensure_department_exists(&state.pool, department).await?;

    let form = collect_form(multipart).await?;
    let content = FreeFormContent::from_submission(&form)?;
    let posted = ContentRepo::post(&state.pool, &content).await?;
    let wire = posted.to_wire_json()?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: wire })))
}

/// Query parameters for the content listing.
#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    /// Comma-separated stream ids (`?stream=5,7`).
    pub stream: String,
    pub limit: Option<i64>,
}

/// GET /api/content?stream=5,7
///
/// Posts in the given streams, newest first, blobs omitted. Playback pages
/// fetch the binary payload through the blob endpoint.
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> AppResult<impl IntoResponse> {
    let streams = query
        .stream
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<DbId>()
                .map_err(|_| AppError::BadRequest(format!("bad stream id '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if streams.is_empty() {
        return Err(AppError::BadRequest(
            "at least one stream id is required".into(),
        ));
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

    let posts = ContentRepo::fetch_in_streams(&state.pool, &streams, limit, false)
        .await?
        .into_iter()
        .map(|row| row.into_content().and_then(|c| c.to_wire_json()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { data: posts }))
}

/// GET /api/content/{id}/blob
///
/// The binary payload of a locally stored image or video post.
pub async fn content_blob(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let content = ContentRepo::fetch_by_id(&state.pool, id, true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no content with id {id}")))?
        .into_content()?;

    let Some((mime_type, Some(blob))) = content.body.blob() else {
        return Err(AppError::NotFound(format!(
            "content {id} has no binary payload"
        )));
    };

    Ok((
        [(header::CONTENT_TYPE, mime_type.to_string())],
        blob.to_vec(),
    ))
}

/// DELETE /api/content/{id}
///
/// Content is immutable after posting; deletion is the only edit.
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ContentRepo::delete(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("no content with id {id}")));
    }
    tracing::info!(content = id, "Content deleted");

    Ok(StatusCode::NO_CONTENT)
}
