use std::collections::HashSet;

use serde_json::json;

use crate::error::CoreError;
use crate::template::property::{TemplateProperty, TemplatePropertyGroup};

/// One entry in a property list: a bare property or a named group of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEntry {
    Property(TemplateProperty),
    Group(TemplatePropertyGroup),
}

/// The full property schema of a template: root entries plus the optional
/// "advanced" fold. Lookup is a single flat namespace over both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateProperties {
    pub root: Vec<PropertyEntry>,
    pub advanced: Vec<PropertyEntry>,
}

impl TemplateProperties {
    /// Get a property by its variable name, searching root entries (groups
    /// included) first, then advanced ones.
    pub fn get_property(&self, variable: &str) -> Option<&TemplateProperty> {
        Self::get_from_entries(&self.root, variable)
            .or_else(|| Self::get_from_entries(&self.advanced, variable))
    }

    fn get_from_entries<'a>(
        entries: &'a [PropertyEntry],
        variable: &str,
    ) -> Option<&'a TemplateProperty> {
        entries.iter().find_map(|entry| match entry {
            PropertyEntry::Property(prop) if prop.variable == variable => Some(prop),
            PropertyEntry::Property(_) => None,
            PropertyEntry::Group(group) => group.get_property(variable),
        })
    }

    /// Every declared property, root before advanced, groups flattened.
    pub fn iter_all(&self) -> impl Iterator<Item = &TemplateProperty> {
        self.root
            .iter()
            .chain(self.advanced.iter())
            .flat_map(|entry| match entry {
                PropertyEntry::Property(prop) => std::slice::from_ref(prop).iter(),
                PropertyEntry::Group(group) => group.properties.iter(),
            })
    }

    /// Variable names must be unique across the whole template; a duplicate
    /// would silently shadow in `get_property`.
    pub fn ensure_unique_variables(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for prop in self.iter_all() {
            if !seen.insert(prop.variable.as_str()) {
                return Err(CoreError::TemplateDefinition(format!(
                    "duplicate property variable '{}'",
                    prop.variable
                )));
            }
        }
        Ok(())
    }

    pub fn to_wire_json(&self) -> serde_json::Value {
        let render = |entries: &[PropertyEntry]| {
            entries
                .iter()
                .map(|entry| match entry {
                    PropertyEntry::Property(prop) => prop.to_wire_json(),
                    PropertyEntry::Group(group) => group.to_wire_json(),
                })
                .collect::<Vec<_>>()
        };
        json!({
            "root": render(&self.root),
            "advanced": render(&self.advanced),
        })
    }
}
