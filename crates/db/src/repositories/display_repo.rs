use campusign_core::types::DbId;
use sqlx::PgPool;

use crate::models::display::DisplayRow;

/// Column list for `displays` queries.
const DISPLAY_COLUMNS: &str = "id, name, department_id, pages, created_at, updated_at";

/// Provides persistence for displays.
pub struct DisplayRepo;

impl DisplayRepo {
    /// Reserve a fresh display identity by inserting an empty placeholder
    /// row. Stored file names embed the id, so it must exist before any
    /// file is written.
    pub async fn reserve_id(pool: &PgPool, department: DbId) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO displays (department_id) VALUES ($1) RETURNING id")
            .bind(department)
            .fetch_one(pool)
            .await
    }

    /// Replace a display's name and page list wholesale. Returns `None` if
    /// the id was never reserved.
    pub async fn replace(
        pool: &PgPool,
        id: DbId,
        name: &str,
        pages: &serde_json::Value,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE displays SET name = $2, pages = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id",
        )
        .bind(id)
        .bind(name)
        .bind(pages)
        .fetch_optional(pool)
        .await
    }

    /// Find a display by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DisplayRow>, sqlx::Error> {
        let query = format!("SELECT {DISPLAY_COLUMNS} FROM displays WHERE id = $1");
        sqlx::query_as::<_, DisplayRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a department's displays ordered by name.
    pub async fn list_by_department(
        pool: &PgPool,
        department: DbId,
    ) -> Result<Vec<DisplayRow>, sqlx::Error> {
        let query = format!(
            "SELECT {DISPLAY_COLUMNS} FROM displays WHERE department_id = $1 ORDER BY name ASC"
        );
        sqlx::query_as::<_, DisplayRow>(&query)
            .bind(department)
            .fetch_all(pool)
            .await
    }
}
