#![allow(dead_code)]

//! Shared harness for pipeline integration tests: every service wired
//! against the in-memory backends.

use std::sync::Arc;

use uuid::Uuid;

use portage_core::context::MigrationContext;
use portage_core::dataset::data_set_for;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_pipeline::convert::ConversionContext;
use portage_pipeline::logging::MemoryLoggingService;
use portage_pipeline::mapping::{MappingService, MappingStore};
use portage_pipeline::media::MemoryMediaFileService;
use portage_pipeline::orchestrator::DataConverter;
use portage_pipeline::registry::ConverterRegistry;
use portage_pipeline::store::MemoryMappingStore;
use portage_pipeline::writer::MemoryWriter;

pub const LOCALE: &str = "en-GB";

pub struct Harness {
    pub connection_id: Uuid,
    pub run_id: Uuid,
    pub store: Arc<MemoryMappingStore>,
    pub mapping: Arc<MappingService>,
    pub media: Arc<MemoryMediaFileService>,
    pub logger: Arc<MemoryLoggingService>,
    pub writer: Arc<MemoryWriter>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Uuid::new_v4(), Arc::new(MemoryMappingStore::new()))
    }

    /// A harness sharing a mapping store with another one — the shape of
    /// a second run against the same persistent state.
    pub fn with_store(connection_id: Uuid, store: Arc<MemoryMappingStore>) -> Self {
        let mapping = Arc::new(MappingService::new(
            connection_id,
            store.clone() as Arc<dyn MappingStore>,
        ));
        Self {
            connection_id,
            run_id: Uuid::now_v7(),
            store,
            mapping,
            media: Arc::new(MemoryMediaFileService::new()),
            logger: Arc::new(MemoryLoggingService::new()),
            writer: Arc::new(MemoryWriter::new()),
        }
    }

    pub fn migration(&self, profile: Profile, entity: EntityKind) -> MigrationContext {
        MigrationContext::new(
            profile,
            self.connection_id,
            self.run_id,
            data_set_for(profile, entity).unwrap(),
            None,
            None,
        )
    }

    pub fn context<'a>(&'a self, migration: &'a MigrationContext) -> ConversionContext<'a> {
        ConversionContext::new(
            migration,
            self.mapping.as_ref(),
            self.media.as_ref(),
            self.logger.as_ref(),
            LOCALE,
        )
    }

    pub fn data_converter(&self) -> DataConverter {
        DataConverter::new(
            Arc::new(ConverterRegistry::with_defaults().unwrap()),
            Arc::clone(&self.mapping),
            self.media.clone(),
            self.logger.clone(),
            self.writer.clone(),
            LOCALE,
        )
    }
}

/// Parse a `"id": "<uuid>"` field out of a converted value.
pub fn uuid_field(value: &serde_json::Value, key: &str) -> Uuid {
    value[key]
        .as_str()
        .unwrap_or_else(|| panic!("field {key} missing or not a string: {value}"))
        .parse()
        .unwrap()
}
