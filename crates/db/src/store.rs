//! Adapter from the repositories to the storage traits the composition
//! engine consumes.

use async_trait::async_trait;
use campusign_core::display::Display;
use campusign_core::error::CoreError;
use campusign_core::store::{DisplayStore, FileStore, StoredFile};
use campusign_core::types::DbId;

use crate::repositories::{DisplayRepo, FileRepo};
use crate::DbPool;

/// Surface a database failure as a storage error. The engine performs no
/// retries; the message is all the caller gets.
pub(crate) fn storage(err: sqlx::Error) -> CoreError {
    CoreError::Storage(err.to_string())
}

/// Postgres-backed implementation of the engine's storage traits.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DisplayStore for PgStore {
    async fn reserve_display_id(&self, department: DbId) -> Result<DbId, CoreError> {
        DisplayRepo::reserve_id(&self.pool, department)
            .await
            .map_err(storage)
    }

    async fn replace_display(&self, display: &Display) -> Result<DbId, CoreError> {
        let pages = serde_json::to_value(&display.pages)
            .map_err(|e| CoreError::Storage(format!("could not encode pages: {e}")))?;
        DisplayRepo::replace(&self.pool, display.id, &display.name, &pages)
            .await
            .map_err(storage)?
            .ok_or(CoreError::NotFound {
                entity: "Display",
                id: display.id,
            })
    }

    async fn fetch_display_by_id(&self, id: DbId) -> Result<Option<Display>, CoreError> {
        DisplayRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(|row| row.into_display())
            .transpose()
    }
}

#[async_trait]
impl FileStore for PgStore {
    async fn store_file(&self, file: &StoredFile, temporary: bool) -> Result<(), CoreError> {
        FileRepo::store(&self.pool, file, temporary)
            .await
            .map(|_| ())
            .map_err(storage)
    }

    async fn fetch_file_by_name(
        &self,
        department: DbId,
        name: &str,
    ) -> Result<Option<StoredFile>, CoreError> {
        Ok(FileRepo::find_by_name(&self.pool, department, name)
            .await
            .map_err(storage)?
            .map(|row| row.into_stored_file()))
    }

    async fn delete_file_by_name(&self, department: DbId, name: &str) -> Result<bool, CoreError> {
        FileRepo::delete_by_name(&self.pool, department, name)
            .await
            .map_err(storage)
    }

    async fn list_file_names(&self, department: DbId) -> Result<Vec<String>, CoreError> {
        FileRepo::list_names_for_department(&self.pool, department)
            .await
            .map_err(storage)
    }
}
