use campusign_core::store::StoredFile;
use campusign_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `files` table.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: DbId,
    pub name: String,
    pub department_id: DbId,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub temporary: bool,
    pub created_at: Timestamp,
}

impl FileRow {
    pub fn into_stored_file(self) -> StoredFile {
        StoredFile {
            name: self.name,
            department: self.department_id,
            mime_type: self.mime_type,
            data: self.data,
        }
    }
}
