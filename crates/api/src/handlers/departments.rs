//! Handlers for department CRUD.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use campusign_db::models::department::CreateDepartment;
use campusign_db::repositories::DepartmentRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/departments
pub async fn list_departments(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let departments = DepartmentRepo::list(&state.pool).await?;

    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/departments
pub async fn create_department(
    State(state): State<AppState>,
    Json(input): Json<CreateDepartment>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let department = DepartmentRepo::create(&state.pool, &input).await?;
    tracing::info!(department = department.id, name = %department.name, "Department created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}
