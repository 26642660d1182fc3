//! The form field naming convention, parsed in exactly one place.
//!
//! The composer form speaks a flat wire convention:
//!
//! - `template-page-<n>`              the template chosen for page `n`
//! - `duration-page-<n>`              page `n`'s duration in seconds
//! - `page-<n>-property-<variable>`   a property value (`[]` suffix on the
//!   variable marks a multi-valued field)
//! - `page-<n>-file-<variable>`       an uploaded file property
//!
//! Anything else (e.g. `name`, `display_id`) is not a page field and passes
//! through untouched. A `page-…` key that does not fit the convention is a
//! malformed submission and rejects the whole operation.

use crate::error::CoreError;

/// A structured view of one composer form key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    /// `template-page-<n>`
    Template { page: u32 },
    /// `duration-page-<n>`
    Duration { page: u32 },
    /// `page-<n>-property-<variable>`
    Property {
        page: u32,
        variable: String,
        multi: bool,
    },
    /// `page-<n>-file-<variable>`
    File { page: u32, variable: String },
}

/// Parse a form key into a [`FieldKey`], `None` for non-page fields.
pub fn parse_field_key(key: &str) -> Result<Option<FieldKey>, CoreError> {
    if let Some(rest) = key.strip_prefix("template-page-") {
        return Ok(Some(FieldKey::Template {
            page: parse_page(rest, key)?,
        }));
    }

    if let Some(rest) = key.strip_prefix("duration-page-") {
        return Ok(Some(FieldKey::Duration {
            page: parse_page(rest, key)?,
        }));
    }

    let Some(rest) = key.strip_prefix("page-") else {
        return Ok(None);
    };

    let (page, kind_and_variable) = rest.split_once('-').ok_or_else(|| malformed(key))?;
    let page = parse_page(page, key)?;

    if let Some(variable) = kind_and_variable.strip_prefix("property-") {
        let (variable, multi) = match variable.strip_suffix("[]") {
            Some(stripped) => (stripped, true),
            None => (variable, false),
        };
        if variable.is_empty() {
            return Err(malformed(key));
        }
        return Ok(Some(FieldKey::Property {
            page,
            variable: variable.to_string(),
            multi,
        }));
    }

    if let Some(variable) = kind_and_variable.strip_prefix("file-") {
        if variable.is_empty() || variable.ends_with("[]") {
            return Err(malformed(key));
        }
        return Ok(Some(FieldKey::File {
            page,
            variable: variable.to_string(),
        }));
    }

    Err(malformed(key))
}

fn parse_page(raw: &str, key: &str) -> Result<u32, CoreError> {
    raw.parse::<u32>().map_err(|_| {
        CoreError::MalformedSubmission(format!("bad page number in field '{key}'"))
    })
}

fn malformed(key: &str) -> CoreError {
    CoreError::MalformedSubmission(format!("unrecognised page field '{key}'"))
}
