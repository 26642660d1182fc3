//! Page templates and their typed property schemas.
//!
//! A template is a reusable layout skeleton with `{{ variable }}` insertion
//! points, declared properties (typed, optionally grouped, optionally behind
//! an "advanced" fold) and a stable id. Templates are parsed once from XML
//! definitions and are immutable afterwards.

mod page;
mod parse;
mod properties;
mod property;
mod registry;

pub use page::PageTemplate;
pub use properties::{PropertyEntry, TemplateProperties};
pub use property::{PropertyType, TemplateProperty, TemplatePropertyGroup};
pub use registry::TemplateRegistry;
