//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod action_repo;
pub mod csv_export_repo;
pub mod job_repo;
pub mod user_repo;

pub use action_repo::ActionRepo;
pub use csv_export_repo::CsvExportRepo;
pub use job_repo::JobRepo;
pub use user_repo::UserRepo;
