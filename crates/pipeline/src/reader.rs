//! The raw-record reading interface.
//!
//! Gateways (local SQL, remote API, file dumps) live outside the core;
//! the pipeline only sees an ordered batch of opaque JSON records per
//! pagination window.

use async_trait::async_trait;
use serde_json::Value;

use portage_core::context::MigrationContext;

use crate::error::StoreError;

/// Fetches raw source records for one data set.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Read one page of raw records; `offset`/`limit` come from the
    /// migration context. The returned batch is opaque and ordered.
    async fn read(&self, migration: &MigrationContext) -> Result<Vec<Value>, StoreError>;

    /// Total number of source records for the data set, when the gateway
    /// can count them.
    async fn read_total(&self, migration: &MigrationContext) -> Result<Option<u64>, StoreError>;
}
