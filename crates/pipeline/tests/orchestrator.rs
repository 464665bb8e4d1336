//! Batch orchestration: per-record failure isolation, batch-level
//! failures, re-run stability, and flush batching.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{uuid_field, Harness, LOCALE};
use serde_json::json;
use uuid::Uuid;

use portage_core::context::MigrationContext;
use portage_core::dataset::DataSet;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_pipeline::error::{PipelineError, StoreError};
use portage_pipeline::logging::{LOG_TYPE_BATCH_ABORTED, LOG_TYPE_EXCEPTION};
use portage_pipeline::mapping::{AdoptedMapping, MappingService, MappingStore, StagedMapping};
use portage_pipeline::orchestrator::DataConverter;
use portage_pipeline::registry::ConverterRegistry;

#[tokio::test]
async fn malformed_record_does_not_abort_the_batch() {
    let h = Harness::new();
    let converter = h.data_converter();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);

    let batch = vec![
        json!({"id": "1", "name": "Roots", "_locale": "en-GB"}),
        json!({"name": "No id at all"}),
        json!({"id": "3", "name": "Leaves", "_locale": "en-GB"}),
    ];
    let summary = converter.convert_batch(batch, &migration).await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.converted, 2);
    assert_eq!(summary.failed, 1);

    // All three rows were written: two converted, one kept as unmapped
    // for diagnostics.
    assert_eq!(h.writer.row_count(), 3);
    let failed = h.writer.get(EntityKind::Category, "unknown").unwrap();
    assert!(failed.convert_failure);
    assert!(failed.converted.is_none());
    assert_eq!(failed.unmapped, Some(json!({"name": "No id at all"})));

    // The failure is in the operator log, attributed to the record.
    let exceptions = h.logger.saved_of_type(LOG_TYPE_EXCEPTION);
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].entity_type, "category");
}

#[tokio::test]
async fn rerun_of_the_same_batch_yields_identical_rows() {
    let h = Harness::new();
    let converter = h.data_converter();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);

    let batch = vec![json!({"id": "1", "name": "Roots", "_locale": "en-GB"})];
    converter
        .convert_batch(batch.clone(), &migration)
        .await
        .unwrap();
    let first = h.writer.get(EntityKind::Category, "1").unwrap();

    converter.convert_batch(batch, &migration).await.unwrap();
    let second = h.writer.get(EntityKind::Category, "1").unwrap();

    // Upsert semantics: still one row, same minted identifier.
    assert_eq!(h.writer.row_count(), 1);
    assert_eq!(
        uuid_field(first.converted.as_ref().unwrap(), "id"),
        uuid_field(second.converted.as_ref().unwrap(), "id")
    );
}

#[tokio::test]
async fn mappings_flush_once_per_batch() {
    let h = Harness::new();
    let converter = h.data_converter();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);

    let batch = vec![
        json!({"id": "1", "parent": "9", "name": "A", "_locale": "en-GB"}),
        json!({"id": "2", "parent": "9", "name": "B", "_locale": "en-GB"}),
        json!({"id": "3", "name": "C", "_locale": "en-GB"}),
    ];
    converter.convert_batch(batch, &migration).await.unwrap();

    assert_eq!(h.store.persist_calls(), 1);
    assert_eq!(h.mapping.staged_count().await, 0);
    // 3 categories + the shared parent placeholder + the default language.
    assert_eq!(h.store.len(), 5);
}

#[tokio::test]
async fn batch_with_no_usable_payload_aborts() {
    let h = Harness::new();
    let converter = h.data_converter();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);

    // Empty objects fail conversion and leave nothing to retain.
    let batch = vec![json!({}), json!({})];
    let error = converter.convert_batch(batch, &migration).await.unwrap_err();

    assert_matches!(error, PipelineError::EmptyBatch { entity: EntityKind::Category });
    assert_eq!(h.writer.row_count(), 0);
    assert_eq!(h.logger.saved_of_type(LOG_TYPE_BATCH_ABORTED).len(), 1);
}

#[tokio::test]
async fn missing_converter_is_a_batch_failure() {
    let h = Harness::new();
    let converter = h.data_converter();

    // No converter ships for products out of a structured 6.x source.
    let migration = MigrationContext::new(
        Profile::Shop6,
        h.connection_id,
        h.run_id,
        DataSet {
            entity: EntityKind::Product,
            api_route: "products",
            counting_table: "product",
        },
        None,
        None,
    );
    let batch = vec![json!({"id": "1"})];
    let error = converter.convert_batch(batch, &migration).await.unwrap_err();

    assert_matches!(
        error,
        PipelineError::NoConverter {
            profile: Profile::Shop6,
            entity: EntityKind::Product,
        }
    );
    assert_eq!(h.writer.row_count(), 0);
}

#[tokio::test]
async fn media_references_flush_and_release_once_per_batch() {
    let h = Harness::new();
    let converter = h.data_converter();
    let migration = h.migration(Profile::Shop5, EntityKind::Media);

    let batch = vec![json!({
        "id": "med1",
        "name": "banner.jpg",
        "path": "media/image/banner.jpg",
        "file_size": 512,
        "_locale": "en-GB"
    })];
    converter.convert_batch(batch, &migration).await.unwrap();

    let flushed = h.media.flushed();
    assert_eq!(flushed.len(), 1);
    assert_eq!(h.media.staged_count(), 0);
    // The written batch released its media reference for transport.
    assert_eq!(h.media.written_ids(), vec![flushed[0].media_id]);
}

// ---------------------------------------------------------------------------
// Mapping flush failure
// ---------------------------------------------------------------------------

/// A store whose persist always fails, to drive the flush-failure path.
#[derive(Default)]
struct BrokenStore;

#[async_trait]
impl MappingStore for BrokenStore {
    async fn fetch(
        &self,
        _connection_id: Uuid,
        _entity: EntityKind,
        _source_id: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        Ok(None)
    }

    async fn fetch_bulk(
        &self,
        _connection_id: Uuid,
        _entity: EntityKind,
        _source_ids: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError> {
        Ok(HashMap::new())
    }

    async fn persist(&self, _entries: &[StagedMapping]) -> Result<Vec<AdoptedMapping>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("mapping store is down")))
    }
}

#[tokio::test]
async fn failed_mapping_flush_aborts_the_batch_without_writing() {
    let h = Harness::new();
    let mapping = Arc::new(MappingService::new(
        h.connection_id,
        Arc::new(BrokenStore),
    ));
    let converter = DataConverter::new(
        Arc::new(ConverterRegistry::with_defaults().unwrap()),
        Arc::clone(&mapping),
        h.media.clone(),
        h.logger.clone(),
        h.writer.clone(),
        LOCALE,
    );
    let migration = h.migration(Profile::Shop5, EntityKind::Category);

    let batch = vec![json!({"id": "1", "name": "Roots", "_locale": "en-GB"})];
    let error = converter.convert_batch(batch, &migration).await.unwrap_err();

    assert_matches!(error, PipelineError::MappingFlush(_));
    // The batch write was skipped entirely and the staged mappings are
    // retained, not silently dropped.
    assert_eq!(h.writer.row_count(), 0);
    assert!(mapping.staged_count().await > 0);
    assert_eq!(h.logger.saved_of_type(LOG_TYPE_BATCH_ABORTED).len(), 1);
}
