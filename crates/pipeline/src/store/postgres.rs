//! Postgres-backed mapping store.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use portage_core::entity::EntityKind;
use portage_db::models::mapping::CreateIdentityMapping;
use portage_db::repositories::MappingRepo;

use crate::error::StoreError;
use crate::mapping::{AdoptedMapping, MappingStore, StagedMapping};

/// Mapping store over the `identity_mappings` table.
///
/// Concurrency control is optimistic: persist inserts with
/// `ON CONFLICT DO NOTHING`, and when rows were skipped the staged keys
/// are re-fetched so the caller adopts whatever UUID won the race.
pub struct PgMappingStore {
    pool: PgPool,
}

impl PgMappingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingStore for PgMappingStore {
    async fn fetch(
        &self,
        connection_id: Uuid,
        entity: EntityKind,
        source_id: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let row = MappingRepo::find(&self.pool, connection_id, entity.as_str(), source_id).await?;
        Ok(row.map(|m| m.target_uuid))
    }

    async fn fetch_bulk(
        &self,
        connection_id: Uuid,
        entity: EntityKind,
        source_ids: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError> {
        let rows =
            MappingRepo::find_bulk(&self.pool, connection_id, entity.as_str(), source_ids).await?;
        Ok(rows.into_iter().map(|m| (m.source_id, m.target_uuid)).collect())
    }

    async fn persist(&self, entries: &[StagedMapping]) -> Result<Vec<AdoptedMapping>, StoreError> {
        let creates: Vec<CreateIdentityMapping> = entries
            .iter()
            .map(|entry| CreateIdentityMapping {
                connection_id: entry.connection_id,
                entity_type: entry.entity_type.as_str().to_string(),
                source_id: entry.source_id.clone(),
                target_uuid: entry.target_uuid,
                checksum: entry.checksum.clone(),
                additional_data: entry.additional_data.clone(),
            })
            .collect();

        let inserted = MappingRepo::insert_ignore_batch(&self.pool, &creates).await?;
        if inserted == entries.len() as u64 {
            return Ok(Vec::new());
        }

        // Some keys lost an allocation race against a concurrent writer.
        // Re-fetch them grouped by entity type and report every key whose
        // stored UUID differs from the one we staged.
        let mut by_entity: HashMap<EntityKind, Vec<&StagedMapping>> = HashMap::new();
        for entry in entries {
            by_entity.entry(entry.entity_type).or_default().push(entry);
        }

        let mut adopted = Vec::new();
        for (entity, group) in by_entity {
            let source_ids: Vec<String> = group.iter().map(|e| e.source_id.clone()).collect();
            let stored = self
                .fetch_bulk(group[0].connection_id, entity, &source_ids)
                .await?;
            for entry in group {
                if let Some(uuid) = stored.get(&entry.source_id) {
                    if *uuid != entry.target_uuid {
                        adopted.push(AdoptedMapping {
                            entity_type: entity,
                            source_id: entry.source_id.clone(),
                            target_uuid: *uuid,
                        });
                    }
                }
            }
        }
        Ok(adopted)
    }
}
