//! In-memory mapping store.
//!
//! Backs dry-run mode, where a migration is exercised without touching
//! the target database, and the pipeline's tests. Honors the same
//! insert-or-fetch contract as the Postgres store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use portage_core::entity::EntityKind;

use crate::error::StoreError;
use crate::mapping::{AdoptedMapping, MappingStore, StagedMapping};

#[derive(Default)]
struct State {
    rows: HashMap<(Uuid, EntityKind, String), Uuid>,
    persist_calls: usize,
}

/// Mapping store kept entirely in process memory.
#[derive(Default)]
pub struct MemoryMappingStore {
    state: Mutex<State>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted rows.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `persist` has been called (one per batch flush).
    pub fn persist_calls(&self) -> usize {
        self.state.lock().unwrap().persist_calls
    }

    /// Pre-seed a mapping, as if a previous run had persisted it.
    pub fn seed(&self, connection_id: Uuid, entity: EntityKind, source_id: &str, target: Uuid) {
        self.state
            .lock()
            .unwrap()
            .rows
            .insert((connection_id, entity, source_id.to_string()), target);
    }
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    async fn fetch(
        &self,
        connection_id: Uuid,
        entity: EntityKind,
        source_id: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .get(&(connection_id, entity, source_id.to_string()))
            .copied())
    }

    async fn fetch_bulk(
        &self,
        connection_id: Uuid,
        entity: EntityKind,
        source_ids: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(source_ids
            .iter()
            .filter_map(|source_id| {
                state
                    .rows
                    .get(&(connection_id, entity, source_id.clone()))
                    .map(|uuid| (source_id.clone(), *uuid))
            })
            .collect())
    }

    async fn persist(&self, entries: &[StagedMapping]) -> Result<Vec<AdoptedMapping>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.persist_calls += 1;
        let mut adopted = Vec::new();
        for entry in entries {
            let key = (entry.connection_id, entry.entity_type, entry.source_id.clone());
            match state.rows.get(&key) {
                Some(stored) if *stored != entry.target_uuid => {
                    adopted.push(AdoptedMapping {
                        entity_type: entry.entity_type,
                        source_id: entry.source_id.clone(),
                        target_uuid: *stored,
                    });
                }
                Some(_) => {}
                None => {
                    state.rows.insert(key, entry.target_uuid);
                }
            }
        }
        Ok(adopted)
    }
}
