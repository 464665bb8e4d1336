//! Staged media file model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use portage_core::types::{DbId, Timestamp};

/// A row from the `migration_media_files` table.
///
/// Each row is one pending binary transfer; the external file transport
/// marks it processed once the binary has been moved.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MediaFile {
    pub id: DbId,
    pub run_id: Uuid,
    pub media_uuid: Uuid,
    pub uri: String,
    pub file_name: String,
    pub file_size: i64,
    pub written: bool,
    pub processed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for staging a media file transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMediaFile {
    pub run_id: Uuid,
    pub media_uuid: Uuid,
    pub uri: String,
    pub file_name: String,
    pub file_size: i64,
}
