//! The batch orchestrator.
//!
//! Drives one batch through its linear stages: converter dispatch,
//! per-record conversion with failure isolation, mapping flush, media
//! flush, batch write, log persistence. A record failure never aborts
//! the batch; a batch failure never escapes to abort the run — the
//! caller logs it and moves on to the next batch.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use portage_core::context::MigrationContext;
use portage_core::record::{self, DataRecord};
use portage_core::run::LogLevel;

use crate::convert::ConversionContext;
use crate::error::PipelineError;
use crate::logging::{self, LoggingService, LOG_TYPE_BATCH_ABORTED};
use crate::mapping::MappingService;
use crate::media::MediaFileService;
use crate::registry::ConverterRegistry;
use crate::writer::Writer;

/// Outcome of one converted batch, fed into the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub failed: usize,
}

/// Converts raw batches and hands the aggregates to the external writer.
pub struct DataConverter {
    registry: Arc<ConverterRegistry>,
    mapping: Arc<MappingService>,
    media: Arc<dyn MediaFileService>,
    logger: Arc<dyn LoggingService>,
    writer: Arc<dyn Writer>,
    default_locale: String,
}

impl DataConverter {
    pub fn new(
        registry: Arc<ConverterRegistry>,
        mapping: Arc<MappingService>,
        media: Arc<dyn MediaFileService>,
        logger: Arc<dyn LoggingService>,
        writer: Arc<dyn Writer>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            mapping,
            media,
            logger,
            writer,
            default_locale: default_locale.into(),
        }
    }

    /// Convert and persist one batch of raw records.
    pub async fn convert_batch(
        &self,
        raw_records: Vec<Value>,
        migration: &MigrationContext,
    ) -> Result<BatchSummary, PipelineError> {
        let entity = migration.data_set.entity;
        let converter = self.registry.get(migration.profile, entity)?;

        let ctx = ConversionContext::new(
            migration,
            self.mapping.as_ref(),
            self.media.as_ref(),
            self.logger.as_ref(),
            self.default_locale.clone(),
        );

        let total = raw_records.len();
        let mut failed = 0;
        let mut records = Vec::with_capacity(total);
        for raw in raw_records {
            let source_id =
                record::get_string(&raw, "id").unwrap_or_else(|| "unknown".to_string());
            match converter.convert(&raw, &ctx).await {
                Ok(result) => {
                    if result.is_failure() {
                        failed += 1;
                    }
                    records.push(DataRecord::from_convert(
                        entity,
                        migration.run_id,
                        source_id,
                        raw,
                        result,
                    ));
                }
                Err(error) => {
                    failed += 1;
                    tracing::warn!(
                        entity = %entity,
                        source_id = %source_id,
                        error = %error,
                        "record conversion failed"
                    );
                    self.logger.add_entry(logging::exception_entry(
                        migration.run_id,
                        entity,
                        &error,
                        Some(source_id.clone()),
                    ));
                    records.push(DataRecord::forced_unmapped(
                        entity,
                        migration.run_id,
                        source_id,
                        raw,
                    ));
                }
            }
        }

        if records.iter().all(DataRecord::is_empty) {
            return self
                .abort_batch(
                    migration,
                    PipelineError::EmptyBatch { entity },
                    "The batch produced neither converted nor unmapped payloads.",
                )
                .await;
        }

        if let Err(error) = converter.write_mapping(&ctx).await {
            return self
                .abort_batch(
                    migration,
                    PipelineError::MappingFlush(error),
                    "Identity mappings could not be persisted; unflushed mappings \
                     would be invisible to later converters.",
                )
                .await;
        }

        self.media
            .write_media_file()
            .await
            .map_err(PipelineError::MediaFlush)?;

        self.writer
            .upsert(&records, migration)
            .await
            .map_err(PipelineError::Write)?;

        // Release this batch's media references for transport.
        let converted: Vec<Value> = records.iter().filter_map(|r| r.converted.clone()).collect();
        let media_ids: Vec<Uuid> = migration.data_set.media_ids(&converted);
        if !media_ids.is_empty() {
            self.media
                .mark_written(migration.run_id, &media_ids)
                .await
                .map_err(PipelineError::MediaFlush)?;
        }

        self.logger
            .save_logging()
            .await
            .map_err(PipelineError::LoggingFlush)?;

        tracing::info!(
            entity = %entity,
            total,
            failed,
            "batch converted"
        );

        Ok(BatchSummary {
            total,
            converted: total - failed,
            failed,
        })
    }

    /// Record a batch-level failure in the run log and surface it; the
    /// batch write is skipped entirely.
    async fn abort_batch(
        &self,
        migration: &MigrationContext,
        error: PipelineError,
        description: &str,
    ) -> Result<BatchSummary, PipelineError> {
        tracing::error!(
            entity = %migration.data_set.entity,
            error = %error,
            "batch aborted"
        );
        self.logger.add_entry(logging::log_entry(
            migration.run_id,
            migration.data_set.entity,
            LogLevel::Error,
            LOG_TYPE_BATCH_ABORTED,
            &format!("{} batch aborted", migration.data_set.entity),
            &format!("{error} {description}"),
            None,
            None,
        ));
        // Best effort: the abort entry matters more than the flush error
        // it might itself hit.
        if let Err(log_error) = self.logger.save_logging().await {
            tracing::error!(error = %log_error, "failed to persist abort log entry");
        }
        Err(error)
    }
}
