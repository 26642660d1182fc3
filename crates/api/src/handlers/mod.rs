//! Handler modules: the logic behind each route tree.

pub mod content;
pub mod departments;
pub mod displays;
pub mod files;
pub mod streams;
pub mod templates;

use campusign_core::error::CoreError;
use campusign_core::types::DbId;
use campusign_db::repositories::DepartmentRepo;

use crate::error::{AppError, AppResult};

/// Verify that a department exists, returning NotFound if it does not.
pub(crate) async fn ensure_department_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<()> {
    if DepartmentRepo::find_by_id(pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Department",
            id,
        }));
    }
    Ok(())
}
