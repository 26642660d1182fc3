//! Pure normalisation of a submitted composer form.
//!
//! All field grouping happens here, before anything touches storage. The
//! incoming form is read-only; normalisation produces a fresh value.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::compose::fields::{parse_field_key, FieldKey};
use crate::display::PropertyValue;
use crate::error::CoreError;
use crate::forms::SubmittedForm;
use crate::types::DbId;

/// One page being composed: its template choice, optional duration, and the
/// property values collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDraft {
    pub template_id: DbId,
    pub duration_secs: Option<u32>,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A composer submission with its fields grouped by page number.
///
/// Page numbers are caller-supplied and purely positional: the map is
/// ordered by them, and they are discarded once the page list is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubmission {
    pub name: String,
    /// Set when the submission edits an existing display.
    pub display_id: Option<DbId>,
    pub pages: BTreeMap<u32, PageDraft>,
}

impl ParsedSubmission {
    pub fn parse(form: &SubmittedForm) -> Result<Self, CoreError> {
        let name = form
            .first("name")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::MalformedSubmission("missing display 'name'".into()))?
            .to_string();

        let display_id = form
            .first("display_id")
            .map(|raw| {
                raw.parse::<DbId>().map_err(|_| {
                    CoreError::MalformedSubmission(format!("bad display id '{raw}'"))
                })
            })
            .transpose()?;

        // Template selections first: they define which pages exist.
        let mut pages = BTreeMap::new();
        for (key, value) in &form.fields {
            if let Some(FieldKey::Template { page }) = parse_field_key(key)? {
                let template_id = value.parse::<DbId>().map_err(|_| {
                    CoreError::MalformedSubmission(format!("bad template id '{value}'"))
                })?;
                pages.insert(
                    page,
                    PageDraft {
                        template_id,
                        duration_secs: None,
                        properties: BTreeMap::new(),
                    },
                );
            }
        }

        for (key, value) in &form.fields {
            match parse_field_key(key)? {
                None | Some(FieldKey::Template { .. }) => {}
                Some(FieldKey::Duration { page }) => {
                    let draft = page_draft(&mut pages, page, key)?;
                    draft.duration_secs = Some(value.parse::<u32>().map_err(|_| {
                        CoreError::MalformedSubmission(format!("bad duration '{value}'"))
                    })?);
                }
                Some(FieldKey::Property {
                    page,
                    variable,
                    multi,
                }) => {
                    let draft = page_draft(&mut pages, page, key)?;
                    if multi {
                        match draft.properties.entry(variable) {
                            Entry::Vacant(slot) => {
                                slot.insert(PropertyValue::Many(vec![value.clone()]));
                            }
                            Entry::Occupied(mut slot) => match slot.get_mut() {
                                PropertyValue::Many(values) => values.push(value.clone()),
                                PropertyValue::Single(_) => {
                                    return Err(CoreError::MalformedSubmission(format!(
                                        "field '{key}' mixes single and multi values"
                                    )));
                                }
                            },
                        }
                    } else if let Entry::Vacant(slot) = draft.properties.entry(variable) {
                        // The first value wins for repeated single-valued keys.
                        slot.insert(PropertyValue::Single(value.clone()));
                    }
                }
                Some(FieldKey::File { .. }) => {
                    return Err(CoreError::MalformedSubmission(format!(
                        "'{key}' must be submitted as a file part"
                    )));
                }
            }
        }

        Ok(Self {
            name,
            display_id,
            pages,
        })
    }
}

/// Look up the draft a page field refers to. Referring to a page with no
/// template selection is a malformed submission.
pub(crate) fn page_draft<'a>(
    pages: &'a mut BTreeMap<u32, PageDraft>,
    page: u32,
    key: &str,
) -> Result<&'a mut PageDraft, CoreError> {
    pages.get_mut(&page).ok_or_else(|| {
        CoreError::MalformedSubmission(format!(
            "field '{key}' references page {page}, which has no template selection"
        ))
    })
}
