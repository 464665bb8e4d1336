//! Repository for the `migration_runs` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::run::{CreateMigrationRun, MigrationRun};

/// Column list for migration_runs queries.
const COLUMNS: &str = "id, run_uuid, connection_id, profile, status, records_total, \
    records_converted, records_failed, started_at, finished_at, created_at, updated_at";

/// Provides CRUD operations for migration runs.
pub struct MigrationRunRepo;

impl MigrationRunRepo {
    /// Create a new run in `running` state, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMigrationRun,
    ) -> Result<MigrationRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO migration_runs (run_uuid, connection_id, profile, status)
             VALUES ($1, $2, $3, 'running')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(input.run_uuid)
            .bind(input.connection_id)
            .bind(&input.profile)
            .fetch_one(pool)
            .await
    }

    /// Find a run by its run uuid.
    pub async fn find_by_run_uuid(
        pool: &PgPool,
        run_uuid: Uuid,
    ) -> Result<Option<MigrationRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM migration_runs WHERE run_uuid = $1");
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(run_uuid)
            .fetch_optional(pool)
            .await
    }

    /// Add batch results to the run counters.
    pub async fn add_counts(
        pool: &PgPool,
        run_uuid: Uuid,
        total: i64,
        converted: i64,
        failed: i64,
    ) -> Result<Option<MigrationRun>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_runs SET
                records_total = records_total + $2,
                records_converted = records_converted + $3,
                records_failed = records_failed + $4,
                updated_at = now()
             WHERE run_uuid = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(run_uuid)
            .bind(total)
            .bind(converted)
            .bind(failed)
            .fetch_optional(pool)
            .await
    }

    /// Move a run into a terminal status and stamp its finish time.
    pub async fn finish(
        pool: &PgPool,
        run_uuid: Uuid,
        status: &str,
    ) -> Result<Option<MigrationRun>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_runs SET
                status = $2,
                finished_at = now(),
                updated_at = now()
             WHERE run_uuid = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(run_uuid)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// List runs of a connection, newest first.
    pub async fn list_by_connection(
        pool: &PgPool,
        connection_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MigrationRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM migration_runs
             WHERE connection_id = $1
             ORDER BY started_at DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, MigrationRun>(&query)
            .bind(connection_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
