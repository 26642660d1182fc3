//! Submitted multipart forms, decoupled from any HTTP framework.
//!
//! The route layer collects multipart parts into a [`SubmittedForm`]; the
//! domain code only ever reads from it, never patches it in place.

/// One uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The form field key this file was submitted under.
    pub field: String,
    /// The client-side file name (used only for its extension).
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A submitted form: ordered text fields (a key may repeat for multi-valued
/// inputs) plus uploaded files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl SubmittedForm {
    /// The first value submitted under `key`, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `key`, in submission order.
    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == key)
    }

    pub fn push_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }
}
