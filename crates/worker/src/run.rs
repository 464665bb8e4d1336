//! The migration run loop.
//!
//! One run walks the profile's data sets in dependency order and pages
//! each one through the pipeline. Batch failures are isolated: the
//! failed batch is logged and skipped, the run keeps going.

use std::sync::Arc;

use uuid::Uuid;

use portage_core::context::MigrationContext;
use portage_core::dataset::data_sets_for;
use portage_core::run::RunStatus;
use portage_db::models::run::CreateMigrationRun;
use portage_db::repositories::MigrationRunRepo;
use portage_pipeline::logging::{LoggingService, MemoryLoggingService, PgLoggingService};
use portage_pipeline::mapping::{MappingService, MappingStore};
use portage_pipeline::media::{MediaFileService, MemoryMediaFileService, PgMediaFileService};
use portage_pipeline::orchestrator::DataConverter;
use portage_pipeline::reader::Reader;
use portage_pipeline::registry::ConverterRegistry;
use portage_pipeline::store::{MemoryMappingStore, PgMappingStore};
use portage_pipeline::writer::{MemoryWriter, PgDataWriter, Writer};

use crate::config::WorkerConfig;
use crate::reader::JsonFileReader;

/// Aggregate outcome of one migration run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub batches: usize,
    pub aborted_batches: usize,
    pub records: i64,
    pub converted: i64,
    pub failed: i64,
}

/// Execute one migration run for the configured connection and profile.
pub async fn run_migration(config: &WorkerConfig) -> anyhow::Result<RunTotals> {
    let run_id = Uuid::now_v7();

    let pool = if config.dry_run {
        None
    } else {
        let pool =
            portage_db::create_pool(&config.database_url, portage_db::DEFAULT_MAX_CONNECTIONS)
                .await?;
        sqlx::migrate!("../../db/migrations").run(&pool).await?;
        portage_db::health_check(&pool).await?;
        Some(pool)
    };

    let (store, media, logger, writer): (
        Arc<dyn MappingStore>,
        Arc<dyn MediaFileService>,
        Arc<dyn LoggingService>,
        Arc<dyn Writer>,
    ) = match &pool {
        Some(pool) => (
            Arc::new(PgMappingStore::new(pool.clone())),
            Arc::new(PgMediaFileService::new(pool.clone())),
            Arc::new(PgLoggingService::new(pool.clone())),
            Arc::new(PgDataWriter::new(pool.clone())),
        ),
        None => (
            Arc::new(MemoryMappingStore::new()),
            Arc::new(MemoryMediaFileService::new()),
            Arc::new(MemoryLoggingService::new()),
            Arc::new(MemoryWriter::new()),
        ),
    };

    let mapping = Arc::new(MappingService::new(config.connection_id, store));
    let registry = Arc::new(ConverterRegistry::with_defaults()?);
    let converter = DataConverter::new(
        registry,
        mapping,
        media,
        logger,
        writer,
        config.locale.clone(),
    );
    let reader = JsonFileReader::new(&config.source_dir);

    if let Some(pool) = &pool {
        MigrationRunRepo::create(
            pool,
            &CreateMigrationRun {
                run_uuid: run_id,
                connection_id: config.connection_id,
                profile: config.profile.as_str().to_string(),
            },
        )
        .await?;
    }

    tracing::info!(
        run_id = %run_id,
        profile = %config.profile,
        dry_run = config.dry_run,
        "migration run starting"
    );

    let mut totals = RunTotals::default();
    for data_set in data_sets_for(config.profile) {
        let mut migration = MigrationContext::new(
            config.profile,
            config.connection_id,
            run_id,
            *data_set,
            None,
            Some(config.batch_size),
        );

        let total = reader.read_total(&migration).await?;
        tracing::info!(entity = %data_set.entity, total = ?total, "migrating data set");

        loop {
            let batch = reader.read(&migration).await?;
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();
            totals.batches += 1;

            match converter.convert_batch(batch, &migration).await {
                Ok(summary) => {
                    totals.records += summary.total as i64;
                    totals.converted += summary.converted as i64;
                    totals.failed += summary.failed as i64;
                    if let Some(pool) = &pool {
                        MigrationRunRepo::add_counts(
                            pool,
                            run_id,
                            summary.total as i64,
                            summary.converted as i64,
                            summary.failed as i64,
                        )
                        .await?;
                    }
                }
                Err(error) => {
                    totals.aborted_batches += 1;
                    tracing::error!(
                        entity = %data_set.entity,
                        offset = migration.offset,
                        error = %error,
                        "batch aborted; continuing with next batch"
                    );
                }
            }

            if batch_len < migration.limit as usize {
                break;
            }
            migration = migration.next_page();
        }
    }

    // A run that produced nothing while batches were aborting is worse
    // than partial: flag it for the operator.
    let status = if totals.aborted_batches > 0 && totals.converted == 0 {
        RunStatus::Aborted
    } else {
        RunStatus::Finished
    };
    if let Some(pool) = &pool {
        MigrationRunRepo::finish(pool, run_id, status.as_str()).await?;
    }

    tracing::info!(
        run_id = %run_id,
        status = %status,
        batches = totals.batches,
        aborted = totals.aborted_batches,
        records = totals.records,
        converted = totals.converted,
        failed = totals.failed,
        "migration run complete"
    );

    Ok(totals)
}
