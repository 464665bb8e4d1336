//! Mapping store backends.

pub mod memory;
pub mod postgres;

pub use memory::MemoryMappingStore;
pub use postgres::PgMappingStore;
