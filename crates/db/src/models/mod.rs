//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod mapping;
pub mod media_file;
pub mod migration_data;
pub mod run;
pub mod run_log;
