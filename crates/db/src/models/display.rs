use campusign_core::display::Display;
use campusign_core::error::CoreError;
use campusign_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `displays` table. Pages travel as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct DisplayRow {
    pub id: DbId,
    pub name: String,
    pub department_id: DbId,
    pub pages: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DisplayRow {
    pub fn into_display(self) -> Result<Display, CoreError> {
        let pages = serde_json::from_value(self.pages).map_err(|e| {
            CoreError::Storage(format!("stored pages of display {} are corrupt: {e}", self.id))
        })?;
        Ok(Display {
            id: self.id,
            name: self.name,
            department: self.department_id,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use campusign_core::display::{Page, PropertyValue};
    use serde_json::json;

    use super::*;

    fn row(pages: serde_json::Value) -> DisplayRow {
        DisplayRow {
            id: 7,
            name: "Foyer".into(),
            department_id: 3,
            pages,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn pages_round_trip_through_jsonb() {
        let pages = vec![Page {
            template: 1,
            duration_secs: 45,
            properties: [("clock_format".to_string(), PropertyValue::from("H:mm"))]
                .into_iter()
                .collect(),
        }];
        let display = row(serde_json::to_value(&pages).unwrap())
            .into_display()
            .unwrap();
        assert_eq!(display.id, 7);
        assert_eq!(display.department, 3);
        assert_eq!(display.pages, pages);
    }

    #[test]
    fn corrupt_pages_surface_as_storage_errors() {
        assert_matches!(
            row(json!({"not": "a page list"})).into_display(),
            Err(CoreError::Storage(_))
        );
    }
}
