//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod content_repo;
pub mod department_repo;
pub mod display_repo;
pub mod file_repo;
pub mod stream_repo;

pub use content_repo::ContentRepo;
pub use department_repo::DepartmentRepo;
pub use display_repo::DisplayRepo;
pub use file_repo::FileRepo;
pub use stream_repo::StreamRepo;
