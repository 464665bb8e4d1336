//! Converted-batch staging model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use portage_core::types::{DbId, Timestamp};

/// A row from the `migration_data` staging table.
///
/// One row per source record, keyed `(connection_id, entity_type,
/// source_id)` so that re-running a migration updates the row in place
/// instead of duplicating it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MigrationData {
    pub id: DbId,
    pub run_id: Uuid,
    pub connection_id: Uuid,
    pub entity_type: String,
    pub source_id: String,
    pub raw: serde_json::Value,
    pub converted: Option<serde_json::Value>,
    pub unmapped: Option<serde_json::Value>,
    pub convert_failure: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for upserting a converted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertMigrationData {
    pub run_id: Uuid,
    pub connection_id: Uuid,
    pub entity_type: String,
    pub source_id: String,
    pub raw: serde_json::Value,
    pub converted: Option<serde_json::Value>,
    pub unmapped: Option<serde_json::Value>,
    pub convert_failure: bool,
}
