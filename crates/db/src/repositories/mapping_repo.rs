//! Repository for the `identity_mappings` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::mapping::{CreateIdentityMapping, IdentityMapping};

/// Column list for identity_mappings queries.
const COLUMNS: &str = "id, connection_id, entity_type, source_id, target_uuid, checksum, \
    additional_data, created_at, updated_at";

/// Provides access to persisted identity mappings.
pub struct MappingRepo;

impl MappingRepo {
    /// Find one mapping by its natural key.
    pub async fn find(
        pool: &PgPool,
        connection_id: Uuid,
        entity_type: &str,
        source_id: &str,
    ) -> Result<Option<IdentityMapping>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM identity_mappings
             WHERE connection_id = $1 AND entity_type = $2 AND source_id = $3"
        );
        sqlx::query_as::<_, IdentityMapping>(&query)
            .bind(connection_id)
            .bind(entity_type)
            .bind(source_id)
            .fetch_optional(pool)
            .await
    }

    /// Find all mappings of one entity type for a set of source ids.
    pub async fn find_bulk(
        pool: &PgPool,
        connection_id: Uuid,
        entity_type: &str,
        source_ids: &[String],
    ) -> Result<Vec<IdentityMapping>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM identity_mappings
             WHERE connection_id = $1 AND entity_type = $2 AND source_id = ANY($3)"
        );
        sqlx::query_as::<_, IdentityMapping>(&query)
            .bind(connection_id)
            .bind(entity_type)
            .bind(source_ids)
            .fetch_all(pool)
            .await
    }

    /// Insert a batch of staged mappings, skipping rows whose natural key
    /// already exists.
    ///
    /// Returns the number of rows actually inserted. `target_uuid` is
    /// never overwritten: a concurrent writer that lost the race keeps
    /// the winner's value (resolved by the caller via a re-fetch).
    pub async fn insert_ignore_batch(
        pool: &PgPool,
        entries: &[CreateIdentityMapping],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                "INSERT INTO identity_mappings
                    (connection_id, entity_type, source_id, target_uuid, checksum, additional_data)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (connection_id, entity_type, source_id) DO NOTHING",
            )
            .bind(entry.connection_id)
            .bind(&entry.entity_type)
            .bind(&entry.source_id)
            .bind(entry.target_uuid)
            .bind(&entry.checksum)
            .bind(&entry.additional_data)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        if inserted < entries.len() as u64 {
            tracing::debug!(
                staged = entries.len(),
                inserted,
                "some mappings already existed; keeping stored target uuids"
            );
        }
        Ok(inserted)
    }

    /// List all mappings of a connection, oldest first.
    pub async fn list_by_connection(
        pool: &PgPool,
        connection_id: Uuid,
    ) -> Result<Vec<IdentityMapping>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM identity_mappings
             WHERE connection_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, IdentityMapping>(&query)
            .bind(connection_id)
            .fetch_all(pool)
            .await
    }

    /// Delete every mapping of a connection. Only the explicit
    /// migration-reset path calls this; a running migration never does.
    pub async fn delete_by_connection(
        pool: &PgPool,
        connection_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM identity_mappings WHERE connection_id = $1")
            .bind(connection_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
