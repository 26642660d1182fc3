use campusign_core::store::StoredFile;
use campusign_core::types::DbId;
use sqlx::PgPool;

use crate::models::file::FileRow;

/// Column list for `files` queries.
const FILE_COLUMNS: &str = "id, name, department_id, mime_type, data, temporary, created_at";

/// Provides persistence for department-scoped files.
pub struct FileRepo;

impl FileRepo {
    /// Store a file, overwriting any previous content under the same
    /// department-scoped name.
    pub async fn store(
        pool: &PgPool,
        file: &StoredFile,
        temporary: bool,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO files (name, department_id, mime_type, data, temporary) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (department_id, name) DO UPDATE SET \
                mime_type = EXCLUDED.mime_type, \
                data = EXCLUDED.data, \
                temporary = EXCLUDED.temporary \
             RETURNING id",
        )
        .bind(&file.name)
        .bind(file.department)
        .bind(&file.mime_type)
        .bind(&file.data)
        .bind(temporary)
        .fetch_one(pool)
        .await
    }

    /// Find a file by its department-scoped name.
    pub async fn find_by_name(
        pool: &PgPool,
        department: DbId,
        name: &str,
    ) -> Result<Option<FileRow>, sqlx::Error> {
        let query =
            format!("SELECT {FILE_COLUMNS} FROM files WHERE department_id = $1 AND name = $2");
        sqlx::query_as::<_, FileRow>(&query)
            .bind(department)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a file by its department-scoped name. Returns whether a row
    /// was removed.
    pub async fn delete_by_name(
        pool: &PgPool,
        department: DbId,
        name: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE department_id = $1 AND name = $2")
            .bind(department)
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All file names stored for a department, for orphan scanning.
    pub async fn list_names_for_department(
        pool: &PgPool,
        department: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM files WHERE department_id = $1 ORDER BY name ASC")
            .bind(department)
            .fetch_all(pool)
            .await
    }
}
