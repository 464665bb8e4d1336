//! Pipeline error taxonomy.
//!
//! Two tiers, matching how the orchestrator recovers:
//!
//! - [`ConvertError`] is record-level. The orchestrator logs it against
//!   the record's source identifier, degrades the record to
//!   fully-unmapped, and the batch continues.
//! - [`PipelineError`] is batch-level (misconfiguration or a failed
//!   flush). The batch is aborted without writing; the surrounding run
//!   proceeds to the next batch.

use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use thiserror::Error;

/// Failure of a storage or transport backend used by a collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A structural problem with one raw record.
///
/// Data-quality problems (a missing optional field) are not errors —
/// converters silently leave those fields unmapped. Only records whose
/// required structure is absent end up here.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("required field `{field}` is missing on {entity} record")]
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },

    #[error("field `{field}` on {entity} record has an unusable value")]
    InvalidField {
        entity: EntityKind,
        field: &'static str,
    },

    #[error("{entity} record is not a JSON object")]
    NotAnObject { entity: EntityKind },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A batch-level failure: nothing of this batch is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no converter registered for profile `{profile}` and entity `{entity}`")]
    NoConverter {
        profile: Profile,
        entity: EntityKind,
    },

    #[error("duplicate converter registration for profile `{profile}` and entity `{entity}`")]
    DuplicateConverter {
        profile: Profile,
        entity: EntityKind,
    },

    #[error("batch for entity `{entity}` produced no usable records")]
    EmptyBatch { entity: EntityKind },

    #[error("failed to flush identity mappings: {0}")]
    MappingFlush(#[source] StoreError),

    #[error("failed to flush staged media files: {0}")]
    MediaFlush(#[source] StoreError),

    #[error("failed to persist run logging: {0}")]
    LoggingFlush(#[source] StoreError),

    #[error("failed to write converted batch: {0}")]
    Write(#[source] StoreError),

    #[error("failed to read source records: {0}")]
    Read(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
