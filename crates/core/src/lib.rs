//! Pure domain types and conversion primitives for the portage migration
//! toolkit.
//!
//! Everything in this crate is synchronous and free of I/O so that it can
//! be used by the pipeline, the persistence layer, and any future CLI
//! tooling without dragging in a runtime.

pub mod checksum;
pub mod context;
pub mod dataset;
pub mod entity;
pub mod locale;
pub mod profile;
pub mod record;
pub mod run;
pub mod types;
