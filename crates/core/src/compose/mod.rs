//! The display composition engine.
//!
//! Turns a submitted form (template choices, per-page durations, property
//! values, uploaded files) into a persisted display and/or a rendered
//! multi-page document.

mod engine;
mod fields;
mod submission;

pub use engine::{Composition, CompositionEngine, CompositionMode, DEFAULT_PAGE_DURATION_SECS};
pub use fields::{parse_field_key, FieldKey};
pub use submission::{PageDraft, ParsedSubmission};
