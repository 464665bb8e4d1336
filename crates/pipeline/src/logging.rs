//! Per-run operator logging.
//!
//! Converters and the orchestrator accumulate entries while a batch is
//! processed; `save_logging` persists the accumulated entries once the
//! batch settles (written or aborted). This is the operator-facing log
//! stream, separate from the process-level `tracing` output.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use portage_core::entity::EntityKind;
use portage_core::run::LogLevel;
use portage_db::models::run_log::CreateRunLogEntry;
use portage_db::repositories::RunLogRepo;

use crate::error::StoreError;

/// Log type for a converter exception recorded against one record.
pub const LOG_TYPE_EXCEPTION: &str = "exception";

/// Log type for an aborted batch (nothing written).
pub const LOG_TYPE_BATCH_ABORTED: &str = "batch_aborted";

/// Log type for a media reference that could not be converted.
pub const LOG_TYPE_MEDIA_NOT_CONVERTED: &str = "media_not_converted";

/// Log type for a source layout that is intentionally not migrated.
pub const LOG_TYPE_SKIPPED: &str = "skipped";

/// Build a log entry.
pub fn log_entry(
    run_id: Uuid,
    entity: EntityKind,
    level: LogLevel,
    log_type: &str,
    title: &str,
    description: &str,
    source_id: Option<String>,
    details: Option<Value>,
) -> CreateRunLogEntry {
    CreateRunLogEntry {
        run_id,
        entity_type: entity.as_str().to_string(),
        level: level.as_str().to_string(),
        log_type: log_type.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        source_id,
        details,
    }
}

/// Build the entry recorded when a converter raises for one record.
pub fn exception_entry(
    run_id: Uuid,
    entity: EntityKind,
    error: &dyn std::error::Error,
    source_id: Option<String>,
) -> CreateRunLogEntry {
    log_entry(
        run_id,
        entity,
        LogLevel::Error,
        LOG_TYPE_EXCEPTION,
        &format!("{entity} record could not be converted"),
        &error.to_string(),
        source_id,
        None,
    )
}

/// Accumulating per-run log sink.
#[async_trait]
pub trait LoggingService: Send + Sync {
    /// Stage one entry.
    fn add_entry(&self, entry: CreateRunLogEntry);

    /// Stage an informational entry.
    fn add_info(
        &self,
        run_id: Uuid,
        entity: EntityKind,
        log_type: &str,
        title: &str,
        description: &str,
        details: Option<Value>,
    ) {
        self.add_entry(log_entry(
            run_id,
            entity,
            LogLevel::Info,
            log_type,
            title,
            description,
            None,
            details,
        ));
    }

    /// Persist everything staged since the last save.
    async fn save_logging(&self) -> Result<usize, StoreError>;
}

/// Logging service writing into the `migration_run_logs` table.
pub struct PgLoggingService {
    pool: PgPool,
    staged: Mutex<Vec<CreateRunLogEntry>>,
}

impl PgLoggingService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            staged: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LoggingService for PgLoggingService {
    fn add_entry(&self, entry: CreateRunLogEntry) {
        self.staged.lock().unwrap().push(entry);
    }

    async fn save_logging(&self) -> Result<usize, StoreError> {
        let entries: Vec<CreateRunLogEntry> =
            std::mem::take(&mut *self.staged.lock().unwrap());
        if entries.is_empty() {
            return Ok(0);
        }
        match RunLogRepo::insert_batch(&self.pool, &entries).await {
            Ok(()) => Ok(entries.len()),
            Err(error) => {
                // Keep the entries staged; dropping them would hide the
                // very failures they describe.
                let mut staged = self.staged.lock().unwrap();
                let mut restored = entries;
                restored.append(&mut staged);
                *staged = restored;
                Err(error.into())
            }
        }
    }
}

/// Logging service keeping entries in memory (dry-run mode and tests).
#[derive(Default)]
pub struct MemoryLoggingService {
    staged: Mutex<Vec<CreateRunLogEntry>>,
    saved: Mutex<Vec<CreateRunLogEntry>>,
}

impl MemoryLoggingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries persisted so far.
    pub fn saved(&self) -> Vec<CreateRunLogEntry> {
        self.saved.lock().unwrap().clone()
    }

    /// Persisted entries of one log type.
    pub fn saved_of_type(&self, log_type: &str) -> Vec<CreateRunLogEntry> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.log_type == log_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LoggingService for MemoryLoggingService {
    fn add_entry(&self, entry: CreateRunLogEntry) {
        self.staged.lock().unwrap().push(entry);
    }

    async fn save_logging(&self) -> Result<usize, StoreError> {
        let mut staged = self.staged.lock().unwrap();
        let count = staged.len();
        self.saved.lock().unwrap().append(&mut staged);
        Ok(count)
    }
}
