use serde_json::json;

use crate::error::CoreError;

/// The declared type of a template property, which decides how a supplied
/// value is treated before substitution into the skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// Plain text, auto-escaped.
    String,
    /// Trusted markup, inserted verbatim. The caller is responsible for
    /// having sanitised it.
    Html,
    /// Escaped for safe inclusion inside an attribute.
    XmlAttribute,
    /// Plain substitution; the declared default keeps its whitespace.
    Raw,
    /// A multi-valued list of content stream ids.
    ContentStreams,
    /// A multi-valued list of page references.
    Pages,
}

impl PropertyType {
    /// Parse from the definition `<type>` string.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "string" => Ok(Self::String),
            "html" => Ok(Self::Html),
            "xml-attribute" => Ok(Self::XmlAttribute),
            "raw" => Ok(Self::Raw),
            "content-streams" => Ok(Self::ContentStreams),
            "pages" => Ok(Self::Pages),
            other => Err(CoreError::TemplateDefinition(format!(
                "unknown property type '{other}'"
            ))),
        }
    }

    /// The definition string, for wire listings.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Html => "html",
            Self::XmlAttribute => "xml-attribute",
            Self::Raw => "raw",
            Self::ContentStreams => "content-streams",
            Self::Pages => "pages",
        }
    }
}

/// A single typed property declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateProperty {
    /// The insertion-point key, unique across the whole template.
    pub variable: String,
    /// The human-readable label shown in the configuration form.
    pub display_name: String,
    pub property_type: PropertyType,
    pub default: Option<String>,
}

impl TemplateProperty {
    pub fn to_wire_json(&self) -> serde_json::Value {
        let mut obj = json!({
            "variable": self.variable,
            "name": self.display_name,
            "type": self.property_type.name(),
        });
        if let Some(default) = &self.default {
            obj["default"] = json!(default);
        }
        obj
    }
}

/// A named collection of properties. Purely organisational: grouping shapes
/// the configuration form but is not a scoping boundary for variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePropertyGroup {
    pub name: String,
    pub properties: Vec<TemplateProperty>,
}

impl TemplatePropertyGroup {
    /// Get a property by its variable name.
    pub fn get_property(&self, variable: &str) -> Option<&TemplateProperty> {
        self.properties.iter().find(|p| p.variable == variable)
    }

    pub fn to_wire_json(&self) -> serde_json::Value {
        json!({
            "group": self.name,
            "properties": self
                .properties
                .iter()
                .map(TemplateProperty::to_wire_json)
                .collect::<Vec<_>>(),
        })
    }
}
