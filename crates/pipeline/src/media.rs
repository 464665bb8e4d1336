//! Media file staging.
//!
//! Converters that encounter an embedded media reference mint the target
//! media UUID and queue the binary transfer here; the orchestrator
//! flushes the queue once per batch. Actual binary transport is the
//! external file-transport collaborator's job — this service only stages
//! and tracks the requests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use portage_db::models::media_file::CreateMediaFile;
use portage_db::repositories::MediaFileRepo;

use crate::error::StoreError;

/// One pending media binary transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFileRequest {
    pub run_id: Uuid,
    pub uri: String,
    pub file_name: String,
    pub file_size: i64,
    pub media_id: Uuid,
}

/// Staging sink for media file transfers.
#[async_trait]
pub trait MediaFileService: Send + Sync {
    /// Queue one media file for transfer.
    fn save_media_file(&self, request: MediaFileRequest);

    /// Persist everything staged since the last flush; called once per
    /// batch.
    async fn write_media_file(&self) -> Result<usize, StoreError>;

    /// Flag the given media as referenced by a written batch, releasing
    /// them for the transport collaborator.
    async fn mark_written(&self, run_id: Uuid, media_ids: &[Uuid]) -> Result<(), StoreError>;
}

/// Media file service writing into the `migration_media_files` table.
pub struct PgMediaFileService {
    pool: PgPool,
    staged: Mutex<Vec<CreateMediaFile>>,
}

impl PgMediaFileService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            staged: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaFileService for PgMediaFileService {
    fn save_media_file(&self, request: MediaFileRequest) {
        self.staged.lock().unwrap().push(CreateMediaFile {
            run_id: request.run_id,
            media_uuid: request.media_id,
            uri: request.uri,
            file_name: request.file_name,
            file_size: request.file_size,
        });
    }

    async fn write_media_file(&self) -> Result<usize, StoreError> {
        let entries: Vec<CreateMediaFile> = std::mem::take(&mut *self.staged.lock().unwrap());
        if entries.is_empty() {
            return Ok(0);
        }
        match MediaFileRepo::insert_ignore_batch(&self.pool, &entries).await {
            Ok(inserted) => Ok(inserted as usize),
            Err(error) => {
                let mut staged = self.staged.lock().unwrap();
                let mut restored = entries;
                restored.append(&mut staged);
                *staged = restored;
                Err(error.into())
            }
        }
    }

    async fn mark_written(&self, run_id: Uuid, media_ids: &[Uuid]) -> Result<(), StoreError> {
        MediaFileRepo::mark_written(&self.pool, run_id, media_ids).await?;
        Ok(())
    }
}

/// Media file service keeping requests in memory (dry-run mode and tests).
#[derive(Default)]
pub struct MemoryMediaFileService {
    staged: Mutex<Vec<MediaFileRequest>>,
    flushed: Mutex<Vec<MediaFileRequest>>,
    written: Mutex<Vec<Uuid>>,
}

impl MemoryMediaFileService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests flushed so far.
    pub fn flushed(&self) -> Vec<MediaFileRequest> {
        self.flushed.lock().unwrap().clone()
    }

    /// Media ids flagged as written.
    pub fn written_ids(&self) -> Vec<Uuid> {
        self.written.lock().unwrap().clone()
    }

    /// Requests staged but not yet flushed.
    pub fn staged_count(&self) -> usize {
        self.staged.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaFileService for MemoryMediaFileService {
    fn save_media_file(&self, request: MediaFileRequest) {
        self.staged.lock().unwrap().push(request);
    }

    async fn write_media_file(&self) -> Result<usize, StoreError> {
        let mut staged = self.staged.lock().unwrap();
        let count = staged.len();
        self.flushed.lock().unwrap().append(&mut staged);
        Ok(count)
    }

    async fn mark_written(&self, _run_id: Uuid, media_ids: &[Uuid]) -> Result<(), StoreError> {
        self.written.lock().unwrap().extend_from_slice(media_ids);
        Ok(())
    }
}
