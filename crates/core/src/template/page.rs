use std::collections::BTreeMap;

use serde_json::json;

use crate::display::PropertyValue;
use crate::error::CoreError;
use crate::escape::escape_markup;
use crate::template::parse::parse_definition;
use crate::template::properties::TemplateProperties;
use crate::template::property::PropertyType;
use crate::types::DbId;

/// A named layout skeleton with holes for its declared properties.
///
/// Immutable after parsing; identified by the stable id the registry
/// assigned it. Displays reference templates by this id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    pub id: DbId,
    pub name: String,
    /// Whether pages of this template carry their own duration (e.g. a
    /// video that plays to the end) rather than a configured one.
    pub intrinsic_duration: bool,
    pub properties: TemplateProperties,
    skeleton: String,
}

impl PageTemplate {
    /// Parse an XML template definition, assigning it the given id.
    pub fn parse(id: DbId, definition: &str) -> Result<Self, CoreError> {
        let parsed = parse_definition(definition)?;
        Ok(Self {
            id,
            name: parsed.name,
            intrinsic_duration: parsed.intrinsic_duration,
            properties: parsed.properties,
            skeleton: parsed.skeleton,
        })
    }

    /// Render the skeleton with the given property values.
    ///
    /// Every supplied key must have a schema entry; an unknown key is a hard
    /// error, since an ungoverned value must never reach the skeleton. The
    /// declared type decides escaping: `html` is trusted markup and inserted
    /// verbatim; every other type is escaped for markup (`& < > " '`), so a
    /// value cannot break out of a text or attribute hole. Holes with no
    /// supplied value fall back to the declared default, then to the empty
    /// string.
    pub fn render(
        &self,
        values: &BTreeMap<String, PropertyValue>,
    ) -> Result<String, CoreError> {
        for key in values.keys() {
            if self.properties.get_property(key).is_none() {
                return Err(CoreError::UnknownProperty(key.clone()));
            }
        }

        let mut out = String::with_capacity(self.skeleton.len());
        let mut rest = self.skeleton.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                CoreError::TemplateDefinition(format!(
                    "unterminated insertion point in template '{}'",
                    self.name
                ))
            })?;
            out.push_str(&self.substitute(after[..end].trim(), values));
            rest = &after[end + 2..];
        }
        out.push_str(rest);

        Ok(out)
    }

    fn substitute(&self, variable: &str, values: &BTreeMap<String, PropertyValue>) -> String {
        let declared = self.properties.get_property(variable);

        let value = match values.get(variable) {
            Some(value) => value.joined(),
            None => match declared.and_then(|p| p.default.clone()) {
                Some(default) => default,
                None => return String::new(),
            },
        };

        match declared.map(|p| p.property_type) {
            Some(PropertyType::Html) => value,
            _ => escape_markup(&value),
        }
    }

    /// The JSON listing consumed by the configuration form.
    pub fn to_wire_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "intrinsic_duration": self.intrinsic_duration,
            "properties": self.properties.to_wire_json(),
        })
    }
}
