//! Handlers for display composition, preview and playback rendering.

use std::collections::BTreeSet;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use campusign_core::compose::{Composition, CompositionMode};
use campusign_core::types::DbId;
use campusign_db::repositories::DisplayRepo;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_department_exists;
use crate::multipart::collect_form;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    /// Comma-separated page numbers to restrict the render to
    /// (`?preview_page=0,2`). Absent or empty means every page.
    pub preview_page: Option<String>,
}

impl PreviewParams {
    fn pages(&self) -> Result<Option<BTreeSet<u32>>, AppError> {
        let Some(raw) = self.preview_page.as_deref() else {
            return Ok(None);
        };
        let pages = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|_| AppError::BadRequest(format!("bad preview page '{s}'")))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(if pages.is_empty() { None } else { Some(pages) })
    }
}

/// GET /api/departments/{dept}/displays
pub async fn list_displays(
    State(state): State<AppState>,
    Path(department): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_department_exists(&state.pool, department).await?;

    let displays = DisplayRepo::list_by_department(&state.pool, department)
        .await?
        .into_iter()
        .map(|row| row.into_display())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { data: displays }))
}

/// POST /api/departments/{dept}/displays
///
/// Commit a composition: validate the submission, write its files, replace
/// the display record.
pub async fn compose_display(
    State(state): State<AppState>,
    Path(department): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    ensure_department_exists(&state.pool, department).await?;

    let form = collect_form(multipart).await?;
    let composition = state
        .engine
        .compose(department, &form, CompositionMode::Commit)
        .await?;

    let Composition::Committed { display, .. } = composition else {
        return Err(AppError::InternalError(
            "commit produced no display record".into(),
        ));
    };

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: json!({ "id": display.id }),
        }),
    ))
}

/// POST /api/departments/{dept}/preview_display
///
/// Render the submission without persisting anything. Uploads come back as
/// inline data URIs, so the output matches what a commit would show.
pub async fn preview_display(
    State(state): State<AppState>,
    Path(department): Path<DbId>,
    Query(params): Query<PreviewParams>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let pages = params.pages()?;
    let form = collect_form(multipart).await?;

    let composition = state
        .engine
        .compose(department, &form, CompositionMode::Preview { pages })
        .await?;

    Ok(document_response(composition.document().to_string()))
}

/// GET /api/displays/{id}
///
/// The playback document, re-derived from the stored pages on every read.
pub async fn render_display(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = state.engine.render_existing(id).await?;

    Ok(document_response(document))
}

fn document_response(document: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], document)
}
