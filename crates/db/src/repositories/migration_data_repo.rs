//! Repository for the `migration_data` staging table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::migration_data::{MigrationData, UpsertMigrationData};

/// Column list for migration_data queries.
const COLUMNS: &str = "id, run_id, connection_id, entity_type, source_id, raw, converted, \
    unmapped, convert_failure, created_at, updated_at";

/// Provides upsert access to converted batches.
pub struct MigrationDataRepo;

impl MigrationDataRepo {
    /// Upsert a batch of converted records in one transaction.
    ///
    /// The key is `(connection_id, entity_type, source_id)`: converting
    /// the same source record twice updates the row in place.
    pub async fn upsert_batch(
        pool: &PgPool,
        records: &[UpsertMigrationData],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO migration_data
                    (run_id, connection_id, entity_type, source_id, raw, converted, unmapped, convert_failure)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (connection_id, entity_type, source_id) DO UPDATE SET
                    run_id = excluded.run_id,
                    raw = excluded.raw,
                    converted = excluded.converted,
                    unmapped = excluded.unmapped,
                    convert_failure = excluded.convert_failure,
                    updated_at = now()",
            )
            .bind(record.run_id)
            .bind(record.connection_id)
            .bind(&record.entity_type)
            .bind(&record.source_id)
            .bind(&record.raw)
            .bind(&record.converted)
            .bind(&record.unmapped)
            .bind(record.convert_failure)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// List staged records of one entity type for a run, oldest first.
    pub async fn list_by_run_and_entity(
        pool: &PgPool,
        run_id: Uuid,
        entity_type: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MigrationData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM migration_data
             WHERE run_id = $1 AND entity_type = $2
             ORDER BY id ASC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, MigrationData>(&query)
            .bind(run_id)
            .bind(entity_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count failed conversions of one entity type for a run.
    pub async fn count_failures(
        pool: &PgPool,
        run_id: Uuid,
        entity_type: &str,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM migration_data
             WHERE run_id = $1 AND entity_type = $2 AND convert_failure = true",
        )
        .bind(run_id)
        .bind(entity_type)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
