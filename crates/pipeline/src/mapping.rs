//! The identity mapping service.
//!
//! Every source identifier that crosses into the target schema goes
//! through here: the service mints a target UUID the first time a
//! `(connection, entity, source id)` triple is seen and returns the same
//! UUID on every later call, within a run and across runs. Mappings are
//! staged in memory and flushed to the backing store once per batch.
//!
//! Forward references work through the same path: when a converter
//! resolves a parent that has not been migrated yet, `create_or_get`
//! mints the placeholder mapping, and the parent's own converter later
//! finds and reuses it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use portage_core::entity::EntityKind;

use crate::error::StoreError;

/// A mapping entry created during conversion but not yet persisted.
#[derive(Debug, Clone)]
pub struct StagedMapping {
    pub connection_id: Uuid,
    pub entity_type: EntityKind,
    pub source_id: String,
    pub target_uuid: Uuid,
    pub checksum: Option<String>,
    pub additional_data: Option<Value>,
}

/// A staged mapping that lost an allocation race at persist time: the
/// store already held an entry for the key, so the stored target UUID
/// wins and the service adopts it.
#[derive(Debug, Clone)]
pub struct AdoptedMapping {
    pub entity_type: EntityKind,
    pub source_id: String,
    pub target_uuid: Uuid,
}

/// Persistence backend for identity mappings.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Look up one mapping.
    async fn fetch(
        &self,
        connection_id: Uuid,
        entity: EntityKind,
        source_id: &str,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Look up many mappings of one entity type at once.
    async fn fetch_bulk(
        &self,
        connection_id: Uuid,
        entity: EntityKind,
        source_ids: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError>;

    /// Persist staged entries. Entries whose key already exists must keep
    /// the stored target UUID and be reported back so the caller can
    /// adopt the winner's value.
    async fn persist(&self, entries: &[StagedMapping]) -> Result<Vec<AdoptedMapping>, StoreError>;
}

struct Inner {
    cache: HashMap<(EntityKind, String), Uuid>,
    staged: Vec<StagedMapping>,
}

/// Stable, idempotent source-to-target identifier translation for one
/// connection.
///
/// The cache and stage sit behind one async mutex so that the
/// check-then-act of `create_or_get` runs under exclusive access; any two
/// batches sharing this service serialize their allocations here.
pub struct MappingService {
    connection_id: Uuid,
    store: Arc<dyn MappingStore>,
    inner: Mutex<Inner>,
}

impl MappingService {
    pub fn new(connection_id: Uuid, store: Arc<dyn MappingStore>) -> Self {
        Self {
            connection_id,
            store,
            inner: Mutex::new(Inner {
                cache: HashMap::new(),
                staged: Vec::new(),
            }),
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Pure lookup: returns the target UUID if the mapping exists in the
    /// cache or the store, without allocating anything.
    pub async fn resolve(
        &self,
        entity: EntityKind,
        source_id: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(uuid) = inner.cache.get(&(entity, source_id.to_string())) {
            return Ok(Some(*uuid));
        }
        let stored = self.store.fetch(self.connection_id, entity, source_id).await?;
        if let Some(uuid) = stored {
            inner.cache.insert((entity, source_id.to_string()), uuid);
        }
        Ok(stored)
    }

    /// Return the existing target UUID for the triple, or mint and stage
    /// a fresh one. Calling this any number of times with the same
    /// arguments yields the same UUID.
    pub async fn create_or_get(
        &self,
        entity: EntityKind,
        source_id: &str,
    ) -> Result<Uuid, StoreError> {
        self.create_or_get_with(entity, source_id, None, None).await
    }

    /// [`create_or_get`](Self::create_or_get) carrying a checksum and
    /// extra payload for the staged entry (used for a record's primary
    /// mapping).
    pub async fn create_or_get_with(
        &self,
        entity: EntityKind,
        source_id: &str,
        checksum: Option<String>,
        additional_data: Option<Value>,
    ) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(uuid) = inner.cache.get(&(entity, source_id.to_string())) {
            return Ok(*uuid);
        }
        if let Some(uuid) = self.store.fetch(self.connection_id, entity, source_id).await? {
            inner.cache.insert((entity, source_id.to_string()), uuid);
            return Ok(uuid);
        }
        let uuid = Uuid::new_v4();
        inner.staged.push(StagedMapping {
            connection_id: self.connection_id,
            entity_type: entity,
            source_id: source_id.to_string(),
            target_uuid: uuid,
            checksum,
            additional_data,
        });
        inner.cache.insert((entity, source_id.to_string()), uuid);
        Ok(uuid)
    }

    /// Batched lookup: resolves every source id that has a mapping in the
    /// cache or the store. Missing ids are simply absent from the result.
    pub async fn resolve_bulk(
        &self,
        entity: EntityKind,
        source_ids: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut resolved = HashMap::new();
        let mut misses = Vec::new();
        for source_id in source_ids {
            match inner.cache.get(&(entity, source_id.clone())) {
                Some(uuid) => {
                    resolved.insert(source_id.clone(), *uuid);
                }
                None => misses.push(source_id.clone()),
            }
        }
        if !misses.is_empty() {
            let fetched = self
                .store
                .fetch_bulk(self.connection_id, entity, &misses)
                .await?;
            for (source_id, uuid) in fetched {
                inner.cache.insert((entity, source_id.clone()), uuid);
                resolved.insert(source_id, uuid);
            }
        }
        Ok(resolved)
    }

    /// Number of entries staged since the last flush.
    pub async fn staged_count(&self) -> usize {
        self.inner.lock().await.staged.len()
    }

    /// Persist everything staged since the last flush. Called once per
    /// batch. On failure the stage is kept so the error is not silently
    /// lossy; the batch that triggered the flush is aborted by the caller.
    pub async fn flush(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.staged.is_empty() {
            return Ok(0);
        }
        let staged = std::mem::take(&mut inner.staged);
        match self.store.persist(&staged).await {
            Ok(adopted) => {
                // A lost allocation race is not an error: the stored value
                // wins and later lookups must see it.
                for entry in adopted {
                    tracing::debug!(
                        entity = %entry.entity_type,
                        source_id = %entry.source_id,
                        "adopting stored mapping after allocation race"
                    );
                    inner
                        .cache
                        .insert((entry.entity_type, entry.source_id), entry.target_uuid);
                }
                Ok(staged.len())
            }
            Err(error) => {
                inner.staged = staged;
                Err(error)
            }
        }
    }
}
