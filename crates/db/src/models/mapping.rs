//! Identity mapping model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use portage_core::types::{DbId, Timestamp};

/// A row from the `identity_mappings` table.
///
/// Unique per `(connection_id, entity_type, source_id)`; `target_uuid` is
/// immutable once the row exists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IdentityMapping {
    pub id: DbId,
    pub connection_id: Uuid,
    pub entity_type: String,
    pub source_id: String,
    pub target_uuid: Uuid,
    pub checksum: Option<String>,
    pub additional_data: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new identity mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIdentityMapping {
    pub connection_id: Uuid,
    pub entity_type: String,
    pub source_id: String,
    pub target_uuid: Uuid,
    pub checksum: Option<String>,
    pub additional_data: Option<serde_json::Value>,
}
