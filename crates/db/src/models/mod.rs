//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the database row,
//! conversions into the domain types from `campusign-core`, and `Deserialize`
//! create DTOs where the API accepts JSON input.

pub mod content;
pub mod department;
pub mod display;
pub mod file;
pub mod stream;
