//! Display and page records.
//!
//! A display's pages are the source of truth: `(template id, duration,
//! property map)` triples in caller-supplied order. Rendered markup is
//! re-derived from them on every read and never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A property value supplied for a page: a single string or, for
/// multi-valued properties such as stream lists, a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Single(String),
    Many(Vec<String>),
}

impl PropertyValue {
    /// The value as it substitutes into a skeleton: multi-valued properties
    /// join with commas.
    pub fn joined(&self) -> String {
        match self {
            PropertyValue::Single(value) => value.clone(),
            PropertyValue::Many(values) => values.join(","),
        }
    }

    /// The single string value, if this is not a list.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            PropertyValue::Single(value) => Some(value),
            PropertyValue::Many(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Single(value.to_string())
    }
}

/// One page of a display: which template renders it, for how long, and the
/// property values filling the template's holes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub template: DbId,
    pub duration_secs: u32,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A display owned by one department. Created once and fully replaced (never
/// incrementally patched) on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: DbId,
    pub name: String,
    pub department: DbId,
    pub pages: Vec<Page>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_values_serialize_flat() {
        let single = PropertyValue::Single("30".into());
        let many = PropertyValue::Many(vec!["5".into(), "7".into()]);
        assert_eq!(serde_json::to_string(&single).unwrap(), r#""30""#);
        assert_eq!(serde_json::to_string(&many).unwrap(), r#"["5","7"]"#);
    }

    #[test]
    fn pages_round_trip_through_json() {
        let page = Page {
            template: 2,
            duration_secs: 45,
            properties: BTreeMap::from([
                ("clock_format".to_string(), PropertyValue::from("H:mm")),
                (
                    "streams".to_string(),
                    PropertyValue::Many(vec!["5".into()]),
                ),
            ]),
        };
        let json = serde_json::to_string(&page).unwrap();
        let back: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
    }
}
