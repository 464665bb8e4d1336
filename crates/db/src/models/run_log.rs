//! Run log entry model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use portage_core::types::{DbId, Timestamp};

/// A row from the `migration_run_logs` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RunLogEntry {
    pub id: DbId,
    pub run_id: Uuid,
    pub entity_type: String,
    pub level: String,
    pub log_type: String,
    pub title: String,
    pub description: String,
    pub source_id: Option<String>,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for creating a run log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunLogEntry {
    pub run_id: Uuid,
    pub entity_type: String,
    pub level: String,
    pub log_type: String,
    pub title: String,
    pub description: String,
    pub source_id: Option<String>,
    pub details: Option<serde_json::Value>,
}
