//! Handlers for content stream CRUD and the composer's stream picker.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use campusign_core::content::{ContentStream, GroupedStreams};
use campusign_core::types::DbId;
use campusign_db::models::stream::CreateStream;
use campusign_db::repositories::StreamRepo;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_department_exists;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the stream listing.
#[derive(Debug, Deserialize)]
pub struct StreamListQuery {
    /// Restrict to the streams visible from this department.
    pub department: Option<DbId>,
}

/// GET /api/streams[?department=…]
pub async fn list_streams(
    State(state): State<AppState>,
    Query(query): Query<StreamListQuery>,
) -> AppResult<impl IntoResponse> {
    let rows = match query.department {
        Some(department) => {
            StreamRepo::list_visible_from_department(&state.pool, department).await?
        }
        None => StreamRepo::list(&state.pool).await?,
    };
    let streams = rows
        .into_iter()
        .map(|row| row.into_stream().map(|s| s.to_wire_json()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { data: streams }))
}

/// POST /api/streams
pub async fn create_stream(
    State(state): State<AppState>,
    Json(input): Json<CreateStream>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    // Rejects a department+display double scope before anything is written.
    let (scope, permissions) = input.scope_and_permissions()?;

    let stream = StreamRepo::create(&state.pool, &input.name, scope, permissions)
        .await?
        .into_stream()?;
    tracing::info!(stream = stream.id, name = %stream.name, "Content stream created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: stream.to_wire_json(),
        }),
    ))
}

/// GET /api/departments/{dept}/streams
///
/// The streams a display composed in this department may reference: public
/// ones plus the department's own. Advisory for the composer form; the
/// content-fetch path does its own access control.
pub async fn composer_streams(
    State(state): State<AppState>,
    Path(department): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_department_exists(&state.pool, department).await?;

    let streams = StreamRepo::list_visible_from_department(&state.pool, department)
        .await?
        .into_iter()
        .map(|row| row.into_stream())
        .collect::<Result<Vec<_>, _>>()?;

    let visible = GroupedStreams::group(streams).filter_to_department(department);
    let wire = |streams: &[ContentStream]| {
        streams.iter().map(ContentStream::to_wire_json).collect::<Vec<_>>()
    };

    Ok(Json(DataResponse {
        data: json!({
            "public": wire(&visible.public),
            "department": visible
                .by_department
                .get(&department)
                .map(|streams| wire(streams))
                .unwrap_or_default(),
        }),
    }))
}
