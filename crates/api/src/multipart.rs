//! Multipart collection into the framework-free form the domain code reads.

use axum::extract::Multipart;
use campusign_core::forms::{SubmittedForm, UploadedFile};

use crate::error::AppError;

/// Drain a multipart request into a [`SubmittedForm`].
///
/// Parts with a file name become uploads; everything else is a text field.
/// A file input left empty in the browser still submits a zero-byte part,
/// which counts as "no upload".
pub async fn collect_form(mut multipart: Multipart) -> Result<SubmittedForm, AppError> {
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field
            .name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("multipart part without a field name".into()))?;

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if data.is_empty() {
                continue;
            }
            form.files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.push_field(name, value);
        }
    }

    Ok(form)
}
