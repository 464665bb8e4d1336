//! The converted-batch writing interface.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use portage_core::context::MigrationContext;
use portage_core::entity::EntityKind;
use portage_core::record::DataRecord;
use portage_db::models::migration_data::UpsertMigrationData;
use portage_db::repositories::MigrationDataRepo;

use crate::error::StoreError;

/// Persists converted batches with upsert semantics: the same source
/// record written twice yields one target row.
#[async_trait]
pub trait Writer: Send + Sync {
    async fn upsert(
        &self,
        records: &[DataRecord],
        migration: &MigrationContext,
    ) -> Result<(), StoreError>;
}

/// Writer staging converted batches into the `migration_data` table.
pub struct PgDataWriter {
    pool: PgPool,
}

impl PgDataWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Writer for PgDataWriter {
    async fn upsert(
        &self,
        records: &[DataRecord],
        migration: &MigrationContext,
    ) -> Result<(), StoreError> {
        let rows: Vec<UpsertMigrationData> = records
            .iter()
            .map(|record| UpsertMigrationData {
                run_id: record.run_id,
                connection_id: migration.connection_id,
                entity_type: record.entity.as_str().to_string(),
                source_id: record.source_id.clone(),
                raw: record.raw.clone(),
                converted: record.converted.clone(),
                unmapped: record.unmapped.clone(),
                convert_failure: record.convert_failure,
            })
            .collect();
        MigrationDataRepo::upsert_batch(&self.pool, &rows).await?;
        Ok(())
    }
}

/// Writer keeping batches in memory (dry-run mode and tests), keyed the
/// same way as the staging table so upserts deduplicate.
#[derive(Default)]
pub struct MemoryWriter {
    rows: Mutex<HashMap<(EntityKind, String), DataRecord>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct rows written.
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Fetch one written row.
    pub fn get(&self, entity: EntityKind, source_id: &str) -> Option<DataRecord> {
        self.rows
            .lock()
            .unwrap()
            .get(&(entity, source_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl Writer for MemoryWriter {
    async fn upsert(
        &self,
        records: &[DataRecord],
        _migration: &MigrationContext,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.insert((record.entity, record.source_id.clone()), record.clone());
        }
        Ok(())
    }
}
