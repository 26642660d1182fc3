//! Narrow interfaces onto the storage collaborator.
//!
//! The composition engine only ever talks to persistence through these
//! traits. The db crate implements them over Postgres; engine tests inject
//! in-memory fakes.

use async_trait::async_trait;

use crate::display::Display;
use crate::error::CoreError;
use crate::types::DbId;

/// A stored department file: bytes plus the mime type browsers need to
/// interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub department: DbId,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Display persistence operations.
#[async_trait]
pub trait DisplayStore: Send + Sync {
    /// Reserve a fresh display identity before any file is written, since
    /// stored file names embed it.
    async fn reserve_display_id(&self, department: DbId) -> Result<DbId, CoreError>;

    /// Replace the display record wholesale with the given pages.
    async fn replace_display(&self, display: &Display) -> Result<DbId, CoreError>;

    async fn fetch_display_by_id(&self, id: DbId) -> Result<Option<Display>, CoreError>;
}

/// Department file persistence operations.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store (or overwrite) a file under its department-scoped name.
    async fn store_file(&self, file: &StoredFile, temporary: bool) -> Result<(), CoreError>;

    async fn fetch_file_by_name(
        &self,
        department: DbId,
        name: &str,
    ) -> Result<Option<StoredFile>, CoreError>;

    async fn delete_file_by_name(&self, department: DbId, name: &str)
        -> Result<bool, CoreError>;

    /// All stored file names for a department, for orphan scanning.
    async fn list_file_names(&self, department: DbId) -> Result<Vec<String>, CoreError>;
}
