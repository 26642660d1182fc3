use std::collections::HashMap;

use serde_json::json;

use crate::error::CoreError;
use crate::types::DbId;

/// Where a content stream is visible from. Exactly one of the three: the
/// sum type makes "department and display both set" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamScope {
    /// Accessible by every department.
    Public,
    /// Accessible only within one department.
    Department(DbId),
    /// Owned by a single display.
    Display(DbId),
}

impl StreamScope {
    /// Build a scope from the two nullable storage columns. A row with both
    /// set violates the exclusivity invariant and is rejected.
    pub fn from_columns(
        department: Option<DbId>,
        display: Option<DbId>,
    ) -> Result<Self, CoreError> {
        match (department, display) {
            (None, None) => Ok(StreamScope::Public),
            (Some(department), None) => Ok(StreamScope::Department(department)),
            (None, Some(display)) => Ok(StreamScope::Display(display)),
            (Some(_), Some(_)) => Err(CoreError::Validation(
                "a content stream cannot be scoped to both a department and a display".into(),
            )),
        }
    }

    pub fn department(&self) -> Option<DbId> {
        match self {
            StreamScope::Department(id) => Some(*id),
            _ => None,
        }
    }

    pub fn display(&self) -> Option<DbId> {
        match self {
            StreamScope::Display(id) => Some(*id),
            _ => None,
        }
    }
}

/// What the posting UI may do with a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    Read,
    Write,
}

impl PermissionLevel {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            other => Err(CoreError::Validation(format!(
                "unknown permission level '{other}'"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// A named, scope-limited bucket of free-form content posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStream {
    pub id: DbId,
    pub name: String,
    pub scope: StreamScope,
    pub permissions: PermissionLevel,
}

impl ContentStream {
    pub fn to_wire_json(&self) -> serde_json::Value {
        let mut obj = json!({
            "id": self.id,
            "name": self.name,
            "permissions": self.permissions.name(),
        });
        match self.scope {
            StreamScope::Public => {}
            StreamScope::Department(id) => obj["department"] = json!(id),
            StreamScope::Display(id) => obj["display"] = json!(id),
        }
        obj
    }
}

/// Content streams bucketed by scope: a derived, read-only view over a
/// fetched stream list, never separately persisted.
#[derive(Debug, Clone, Default)]
pub struct GroupedStreams {
    pub public: Vec<ContentStream>,
    pub by_department: HashMap<DbId, Vec<ContentStream>>,
    /// Each display owns at most one stream.
    pub by_display: HashMap<DbId, ContentStream>,
}

impl GroupedStreams {
    pub fn group(streams: Vec<ContentStream>) -> Self {
        let mut grouped = GroupedStreams::default();
        for stream in streams {
            match stream.scope {
                StreamScope::Public => grouped.public.push(stream),
                StreamScope::Department(id) => {
                    grouped.by_department.entry(id).or_default().push(stream);
                }
                StreamScope::Display(id) => {
                    grouped.by_display.insert(id, stream);
                }
            }
        }
        grouped
    }

    /// The streams a freshly-composed display in `department` may reference:
    /// public ones plus that department's own. Display-scoped streams are
    /// dropped, since a new display cannot yet own one.
    ///
    /// Advisory only (it feeds the composer's stream picker); actual read
    /// access control belongs to the content-fetch path.
    pub fn filter_to_department(&self, department: DbId) -> GroupedStreams {
        let mut by_department = HashMap::new();
        if let Some(streams) = self.by_department.get(&department) {
            by_department.insert(department, streams.clone());
        }
        GroupedStreams {
            public: self.public.clone(),
            by_department,
            by_display: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn stream(id: DbId, scope: StreamScope) -> ContentStream {
        ContentStream {
            id,
            name: format!("stream {id}"),
            scope,
            permissions: PermissionLevel::Write,
        }
    }

    #[test]
    fn scope_columns_are_mutually_exclusive() {
        assert_eq!(
            StreamScope::from_columns(None, None).unwrap(),
            StreamScope::Public
        );
        assert_eq!(
            StreamScope::from_columns(Some(2), None).unwrap(),
            StreamScope::Department(2)
        );
        assert_eq!(
            StreamScope::from_columns(None, Some(3)).unwrap(),
            StreamScope::Display(3)
        );
        assert_matches!(
            StreamScope::from_columns(Some(2), Some(3)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn grouping_buckets_by_scope() {
        let grouped = GroupedStreams::group(vec![
            stream(1, StreamScope::Public),
            stream(2, StreamScope::Department(10)),
            stream(3, StreamScope::Department(10)),
            stream(4, StreamScope::Department(11)),
            stream(5, StreamScope::Display(20)),
        ]);

        assert_eq!(grouped.public.len(), 1);
        assert_eq!(grouped.by_department[&10].len(), 2);
        assert_eq!(grouped.by_department[&11].len(), 1);
        assert_eq!(grouped.by_display[&20].id, 5);
    }

    #[test]
    fn department_filter_keeps_public_and_own_streams_only() {
        let grouped = GroupedStreams::group(vec![
            stream(1, StreamScope::Public),
            stream(2, StreamScope::Department(10)),
            stream(3, StreamScope::Department(11)),
            stream(4, StreamScope::Display(20)),
        ]);

        let filtered = grouped.filter_to_department(10);
        assert_eq!(filtered.public.len(), 1);
        assert_eq!(filtered.by_department.len(), 1);
        assert!(filtered.by_department.contains_key(&10));
        // a new display cannot yet own a stream
        assert!(filtered.by_display.is_empty());

        // the original grouping is untouched
        assert_eq!(grouped.by_department.len(), 2);
        assert_eq!(grouped.by_display.len(), 1);
    }

    #[test]
    fn wire_json_carries_scope_fields() {
        let public = stream(1, StreamScope::Public).to_wire_json();
        assert!(public.get("department").is_none());
        assert!(public.get("display").is_none());

        let dept = stream(2, StreamScope::Department(7)).to_wire_json();
        assert_eq!(dept["department"], 7);
        assert_eq!(dept["permissions"], "write");
    }
}
