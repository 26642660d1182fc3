use campusign_core::content::{ContentBody, FreeFormContent};
use campusign_core::error::CoreError;
use campusign_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `content` table joined with its stream memberships.
///
/// `blob` is populated only by the dedicated blob fetch; list queries select
/// `NULL` in its place to keep result sets small.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: DbId,
    #[sqlx(rename = "type")]
    pub type_name: String,
    pub data: serde_json::Value,
    pub mime_type: Option<String>,
    pub blob: Option<Vec<u8>>,
    pub posted: Timestamp,
    pub streams: Vec<DbId>,
}

impl ContentRow {
    /// Rebuild the domain value. Inverts the storage serialization exactly.
    pub fn into_content(self) -> Result<FreeFormContent, CoreError> {
        let body = ContentBody::from_storage(
            &self.type_name,
            &self.data,
            self.mime_type.as_deref(),
            self.blob,
        )?;
        Ok(FreeFormContent {
            id: Some(self.id),
            posted: Some(self.posted),
            streams: self.streams,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn row(type_name: &str, data: serde_json::Value) -> ContentRow {
        ContentRow {
            id: 11,
            type_name: type_name.into(),
            data,
            mime_type: None,
            blob: None,
            posted: chrono::Utc::now(),
            streams: vec![5],
        }
    }

    #[test]
    fn rows_rebuild_the_posted_envelope() {
        let content = row("link", json!({"url": "https://example.com"}))
            .into_content()
            .unwrap();
        assert_eq!(content.id, Some(11));
        assert!(content.posted.is_some());
        assert_eq!(content.streams, vec![5]);
        assert_matches!(content.body, ContentBody::Link { .. });
    }

    #[test]
    fn unknown_stored_types_are_rejected() {
        assert_matches!(
            row("calendar", json!({})).into_content(),
            Err(CoreError::UnknownContentType(_))
        );
    }

    #[test]
    fn blobless_binary_rows_rebuild_without_payload() {
        let mut binary = row("local_image", json!({}));
        binary.mime_type = Some("image/png".into());
        let content = binary.into_content().unwrap();
        assert_matches!(
            content.body,
            ContentBody::LocalImage { blob: None, ref mime_type, .. } if mime_type == "image/png"
        );
    }
}
