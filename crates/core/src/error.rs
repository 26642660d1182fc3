use crate::types::DbId;

/// Domain error taxonomy. Every variant is fatal for the operation that
/// raised it; no partial state is committed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A submitted form field name or shape could not be parsed.
    #[error("Malformed submission: {0}")]
    MalformedSubmission(String),

    /// A page referenced a template id the registry does not know.
    #[error("Unknown template: {0}")]
    UnknownTemplate(DbId),

    /// A supplied property key has no entry in the template's schema.
    #[error("Unknown template property: {0}")]
    UnknownProperty(String),

    /// An uploaded media payload failed to decode or verify.
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    /// The content-model `type` discriminator was not recognised.
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    /// A template definition document was structurally invalid.
    #[error("Invalid template definition: {0}")]
    TemplateDefinition(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// An error from the storage collaborator. Propagated uncaught; this
    /// engine performs no retries.
    #[error("Storage error: {0}")]
    Storage(String),
}
