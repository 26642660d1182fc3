use campusign_core::content::{PermissionLevel, StreamScope};
use campusign_core::types::DbId;
use sqlx::PgPool;

use crate::models::stream::StreamRow;

/// Column list for `content_streams` queries.
const STREAM_COLUMNS: &str = "id, name, department_id, display_id, permissions, created_at";

/// Provides persistence for content streams.
pub struct StreamRepo;

impl StreamRepo {
    /// Create a stream with the given scope. The scope's exclusivity has
    /// already been established by the caller; the table's check constraint
    /// backs it up.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        scope: StreamScope,
        permissions: PermissionLevel,
    ) -> Result<StreamRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_streams (name, department_id, display_id, permissions) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {STREAM_COLUMNS}"
        );
        sqlx::query_as::<_, StreamRow>(&query)
            .bind(name)
            .bind(scope.department())
            .bind(scope.display())
            .bind(permissions.name())
            .fetch_one(pool)
            .await
    }

    /// Find a stream by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StreamRow>, sqlx::Error> {
        let query = format!("SELECT {STREAM_COLUMNS} FROM content_streams WHERE id = $1");
        sqlx::query_as::<_, StreamRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all streams ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<StreamRow>, sqlx::Error> {
        let query = format!("SELECT {STREAM_COLUMNS} FROM content_streams ORDER BY name ASC");
        sqlx::query_as::<_, StreamRow>(&query).fetch_all(pool).await
    }

    /// List the streams visible from a department: public streams, the
    /// department's own, and those owned by its displays.
    pub async fn list_visible_from_department(
        pool: &PgPool,
        department: DbId,
    ) -> Result<Vec<StreamRow>, sqlx::Error> {
        let query = format!(
            "SELECT {STREAM_COLUMNS} FROM content_streams \
             WHERE (department_id IS NULL AND display_id IS NULL) \
                OR department_id = $1 \
                OR display_id IN (SELECT id FROM displays WHERE department_id = $1) \
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, StreamRow>(&query)
            .bind(department)
            .fetch_all(pool)
            .await
    }
}
