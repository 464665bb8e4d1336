//! Repository for the `migration_media_files` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::media_file::{CreateMediaFile, MediaFile};

/// Column list for migration_media_files queries.
const COLUMNS: &str =
    "id, run_id, media_uuid, uri, file_name, file_size, written, processed, created_at, updated_at";

/// Provides CRUD operations for staged media file transfers.
pub struct MediaFileRepo;

impl MediaFileRepo {
    /// Stage a batch of media files, skipping ones already staged for
    /// this run.
    pub async fn insert_ignore_batch(
        pool: &PgPool,
        entries: &[CreateMediaFile],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                "INSERT INTO migration_media_files
                    (run_id, media_uuid, uri, file_name, file_size)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (run_id, media_uuid) DO NOTHING",
            )
            .bind(entry.run_id)
            .bind(entry.media_uuid)
            .bind(&entry.uri)
            .bind(&entry.file_name)
            .bind(entry.file_size)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// List unprocessed media files for a run, oldest first.
    pub async fn list_pending(
        pool: &PgPool,
        run_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MediaFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM migration_media_files
             WHERE run_id = $1 AND processed = false
             ORDER BY id ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(run_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Flag media referenced by a written batch, releasing them for the
    /// file transport.
    pub async fn mark_written(
        pool: &PgPool,
        run_id: Uuid,
        media_uuids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE migration_media_files SET written = true, updated_at = now()
             WHERE run_id = $1 AND media_uuid = ANY($2)",
        )
        .bind(run_id)
        .bind(media_uuids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark a staged media file as transferred.
    pub async fn mark_processed(
        pool: &PgPool,
        run_id: Uuid,
        media_uuid: Uuid,
    ) -> Result<Option<MediaFile>, sqlx::Error> {
        let query = format!(
            "UPDATE migration_media_files SET processed = true, updated_at = now()
             WHERE run_id = $1 AND media_uuid = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaFile>(&query)
            .bind(run_id)
            .bind(media_uuid)
            .fetch_optional(pool)
            .await
    }
}
