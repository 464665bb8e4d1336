//! Migration run model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use portage_core::types::{DbId, Timestamp};

/// A row from the `migration_runs` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MigrationRun {
    pub id: DbId,
    pub run_uuid: Uuid,
    pub connection_id: Uuid,
    pub profile: String,
    pub status: String,
    pub records_total: i64,
    pub records_converted: i64,
    pub records_failed: i64,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new migration run.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMigrationRun {
    pub run_uuid: Uuid,
    pub connection_id: Uuid,
    pub profile: String,
}
