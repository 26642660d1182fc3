use campusign_core::content::{ContentStream, PermissionLevel, StreamScope};
use campusign_core::error::CoreError;
use campusign_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `content_streams` table.
#[derive(Debug, Clone, FromRow)]
pub struct StreamRow {
    pub id: DbId,
    pub name: String,
    pub department_id: Option<DbId>,
    pub display_id: Option<DbId>,
    pub permissions: String,
    pub created_at: Timestamp,
}

impl StreamRow {
    pub fn into_stream(self) -> Result<ContentStream, CoreError> {
        Ok(ContentStream {
            id: self.id,
            name: self.name,
            scope: StreamScope::from_columns(self.department_id, self.display_id)?,
            permissions: PermissionLevel::from_name(&self.permissions)?,
        })
    }
}

/// DTO for creating a content stream. At most one of `department` / `display`
/// may be set; the scope check happens before the insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStream {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub department: Option<DbId>,
    pub display: Option<DbId>,
    pub permissions: Option<String>,
}

impl CreateStream {
    /// Resolve and validate the requested scope and permission level.
    pub fn scope_and_permissions(&self) -> Result<(StreamScope, PermissionLevel), CoreError> {
        let scope = StreamScope::from_columns(self.department, self.display)?;
        let permissions = match &self.permissions {
            Some(name) => PermissionLevel::from_name(name)?,
            None => PermissionLevel::Read,
        };
        Ok((scope, permissions))
    }
}
