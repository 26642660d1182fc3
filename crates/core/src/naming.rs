//! Display file naming convention.
//!
//! Files uploaded through the display composer are stored under deterministic
//! names that embed the owning display's identity, so an edit can find and
//! delete the files a previous revision left behind.

use crate::types::DbId;

/// Generate the stored name for a file uploaded via a display page property.
///
/// Convention: `_display-{id}-{display name}-{field key}{ext}`
///
/// `field_key` is the full form key (`page-<n>-file-<variable>`), which makes
/// the name unique per (display, page, property) triple. `extension` includes
/// its leading dot, or is empty when the upload had none.
pub fn display_file_name(
    display_id: DbId,
    display_name: &str,
    field_key: &str,
    extension: &str,
) -> String {
    format!("_display-{display_id}-{display_name}-{field_key}{extension}")
}

/// Whether a stored file name indicates membership in the given display.
pub fn belongs_to_display(file_name: &str, display_id: DbId) -> bool {
    file_name.starts_with(&format!("_display-{display_id}-"))
}

/// The fetch URL under which a stored department file is served.
pub fn file_url(department_id: DbId, file_name: &str) -> String {
    format!("/api/departments/{department_id}/files/{file_name}")
}

/// Extract the trailing stored file name from a fetch URL previously issued
/// by [`file_url`] for this department. Returns `None` for any other value.
pub fn file_name_from_url(department_id: DbId, url: &str) -> Option<&str> {
    url.strip_prefix(&format!("/api/departments/{department_id}/files/"))
}

/// The extension of an uploaded file name, including the leading dot.
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        // A leading dot is a hidden-file convention, not an extension.
        Some(0) | None => "",
        Some(idx) => &file_name[idx..],
    }
}
