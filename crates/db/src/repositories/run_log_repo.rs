//! Repository for the `migration_run_logs` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::run_log::{CreateRunLogEntry, RunLogEntry};

/// Column list for migration_run_logs queries.
const COLUMNS: &str = "id, run_id, entity_type, level, log_type, title, description, \
    source_id, details, created_at";

/// Provides CRUD operations for run log entries.
pub struct RunLogRepo;

impl RunLogRepo {
    /// Create a single log entry, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRunLogEntry,
    ) -> Result<RunLogEntry, sqlx::Error> {
        let details = input.details.clone().unwrap_or_else(|| serde_json::json!({}));
        let query = format!(
            "INSERT INTO migration_run_logs
                (run_id, entity_type, level, log_type, title, description, source_id, details)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RunLogEntry>(&query)
            .bind(input.run_id)
            .bind(&input.entity_type)
            .bind(&input.level)
            .bind(&input.log_type)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.source_id)
            .bind(&details)
            .fetch_one(pool)
            .await
    }

    /// Insert a batch of accumulated log entries in one transaction.
    pub async fn insert_batch(
        pool: &PgPool,
        entries: &[CreateRunLogEntry],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for entry in entries {
            let details = entry.details.clone().unwrap_or_else(|| serde_json::json!({}));
            sqlx::query(
                "INSERT INTO migration_run_logs
                    (run_id, entity_type, level, log_type, title, description, source_id, details)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(entry.run_id)
            .bind(&entry.entity_type)
            .bind(&entry.level)
            .bind(&entry.log_type)
            .bind(&entry.title)
            .bind(&entry.description)
            .bind(&entry.source_id)
            .bind(&details)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// List log entries for a run, oldest first.
    pub async fn list_by_run(
        pool: &PgPool,
        run_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RunLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM migration_run_logs
             WHERE run_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RunLogEntry>(&query)
            .bind(run_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count log entries grouped by severity for a run.
    ///
    /// Returns tuples of (level, count).
    pub async fn count_by_level(
        pool: &PgPool,
        run_id: Uuid,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        let rows: Vec<LevelCount> = sqlx::query_as(
            "SELECT level, COUNT(*) as count FROM migration_run_logs
             WHERE run_id = $1
             GROUP BY level
             ORDER BY level",
        )
        .bind(run_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.level, r.count)).collect())
    }
}

/// Helper struct for the count_by_level query.
#[derive(sqlx::FromRow)]
struct LevelCount {
    level: String,
    count: i64,
}
