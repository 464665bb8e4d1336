//! File-dump reader.
//!
//! Reads raw records from one JSON array file per data set
//! (`<source_dir>/<entity>.json`), honoring the migration context's
//! pagination window. This stands in for the SQL/API gateways, which
//! live outside the pipeline.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use portage_core::context::MigrationContext;
use portage_pipeline::error::StoreError;
use portage_pipeline::reader::Reader;

pub struct JsonFileReader {
    root: PathBuf,
}

impl JsonFileReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, migration: &MigrationContext) -> PathBuf {
        self.root
            .join(format!("{}.json", migration.data_set.entity.as_str()))
    }

    async fn load(&self, migration: &MigrationContext) -> Result<Option<Vec<Value>>, StoreError> {
        let path = self.path_for(migration);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let records: Vec<Value> = serde_json::from_slice(&bytes)?;
        Ok(Some(records))
    }
}

#[async_trait]
impl Reader for JsonFileReader {
    async fn read(&self, migration: &MigrationContext) -> Result<Vec<Value>, StoreError> {
        let Some(records) = self.load(migration).await? else {
            return Ok(Vec::new());
        };
        Ok(records
            .into_iter()
            .skip(migration.offset.max(0) as usize)
            .take(migration.limit.max(0) as usize)
            .collect())
    }

    async fn read_total(&self, migration: &MigrationContext) -> Result<Option<u64>, StoreError> {
        Ok(self
            .load(migration)
            .await?
            .map(|records| records.len() as u64))
    }
}
