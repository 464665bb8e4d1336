//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod mapping_repo;
pub mod media_file_repo;
pub mod migration_data_repo;
pub mod migration_run_repo;
pub mod run_log_repo;

pub use mapping_repo::MappingRepo;
pub use media_file_repo::MediaFileRepo;
pub use migration_data_repo::MigrationDataRepo;
pub use migration_run_repo::MigrationRunRepo;
pub use run_log_repo::RunLogRepo;
