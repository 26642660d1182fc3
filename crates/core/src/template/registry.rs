use crate::error::CoreError;
use crate::template::page::PageTemplate;
use crate::types::DbId;

/// The built-in template definitions shipped with the binary. Loading is a
/// full replace, never a merge, so edits to these files take effect on every
/// restart.
const BUILTIN_DEFINITIONS: &[&str] = &[
    include_str!("builtins/simple.xml"),
    include_str!("builtins/content_only.xml"),
    include_str!("builtins/room_signage.xml"),
];

/// An explicit template repository: constructed once at process start and
/// injected into the composition engine.
///
/// Ids are assigned sequentially in load order and are stable for the
/// process lifetime. Deleting a template out from under a live display is
/// the caller's problem; the registry does not track references.
#[derive(Debug)]
pub struct TemplateRegistry {
    templates: Vec<PageTemplate>,
}

impl TemplateRegistry {
    /// Build a registry from the built-in definitions.
    pub fn with_builtins() -> Result<Self, CoreError> {
        Self::from_definitions(BUILTIN_DEFINITIONS)
    }

    /// Build a registry from the given XML definitions, replacing nothing
    /// because there is nothing to replace: the previous registry is simply
    /// dropped by the caller.
    pub fn from_definitions(definitions: &[&str]) -> Result<Self, CoreError> {
        let templates = definitions
            .iter()
            .enumerate()
            .map(|(idx, xml)| PageTemplate::parse(idx as DbId + 1, xml))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    pub fn fetch_by_id(&self, id: DbId) -> Option<&PageTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn fetch_by_name(&self, name: &str) -> Option<&PageTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn fetch_all(&self) -> &[PageTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_load_with_sequential_ids() {
        let registry = TemplateRegistry::with_builtins().unwrap();
        assert_eq!(registry.len(), 3);
        let ids: Vec<_> = registry.fetch_all().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(registry.fetch_by_id(1).unwrap().name, "Simple");
        assert!(registry.fetch_by_name("Content Only").is_some());
        assert!(registry.fetch_by_id(99).is_none());
    }

    #[test]
    fn content_only_declares_intrinsic_duration() {
        let registry = TemplateRegistry::with_builtins().unwrap();
        assert!(registry.fetch_by_name("Content Only").unwrap().intrinsic_duration);
        assert!(!registry.fetch_by_name("Simple").unwrap().intrinsic_duration);
    }

    #[test]
    fn every_builtin_renders_with_defaults_alone() {
        let registry = TemplateRegistry::with_builtins().unwrap();
        for template in registry.fetch_all() {
            template
                .render(&Default::default())
                .unwrap_or_else(|e| panic!("{} failed: {e}", template.name));
        }
    }

    #[test]
    fn reload_replaces_the_set() {
        let first = TemplateRegistry::with_builtins().unwrap();
        assert_eq!(first.len(), 3);

        let only = "<template><name>Only</name><properties>\
            <property><variable>x</variable><name>X</name><type>string</type></property>\
            </properties><page><p>{{ x }}</p></page></template>";
        let second = TemplateRegistry::from_definitions(&[only]).unwrap();

        // replaced, not merged: one template, ids restart at 1
        assert_eq!(second.len(), 1);
        assert_eq!(second.fetch_by_id(1).unwrap().name, "Only");
        assert!(second.fetch_by_name("Simple").is_none());
    }
}
