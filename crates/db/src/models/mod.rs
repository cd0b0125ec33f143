//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct
//! matching the database row plus any create/query DTOs for it.

pub mod action;
pub mod csv_export;
pub mod job;
pub mod status;
pub mod user;
