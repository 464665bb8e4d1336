//! Converter dispatch.
//!
//! The registry probes every converter's `supports` predicate over the
//! profile × entity matrix once at startup and keeps a flat lookup
//! table, so per-batch dispatch is a hash lookup instead of a scan.
//! Two converters claiming the same pair is a configuration bug and
//! fails construction.

use std::collections::HashMap;
use std::sync::Arc;

use portage_core::entity::EntityKind;
use portage_core::profile::Profile;

use crate::convert::{all_converters, Converter};
use crate::error::PipelineError;

#[derive(Debug)]
pub struct ConverterRegistry {
    table: HashMap<(Profile, EntityKind), Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Build a registry from an explicit converter list.
    pub fn new(converters: Vec<Arc<dyn Converter>>) -> Result<Self, PipelineError> {
        let mut table: HashMap<(Profile, EntityKind), Arc<dyn Converter>> = HashMap::new();
        for converter in converters {
            for profile in Profile::ALL.iter().filter_map(|s| Profile::from_str(s)) {
                for entity in EntityKind::ALL.iter().filter_map(|s| EntityKind::from_str(s)) {
                    if !converter.supports(profile, entity) {
                        continue;
                    }
                    if table.insert((profile, entity), Arc::clone(&converter)).is_some() {
                        return Err(PipelineError::DuplicateConverter { profile, entity });
                    }
                }
            }
        }
        Ok(Self { table })
    }

    /// Build a registry with every converter the pipeline ships.
    pub fn with_defaults() -> Result<Self, PipelineError> {
        Self::new(all_converters())
    }

    /// Converter for a (profile, entity) pair. A miss is a batch-level
    /// configuration failure, not bad data.
    pub fn get(
        &self,
        profile: Profile,
        entity: EntityKind,
    ) -> Result<Arc<dyn Converter>, PipelineError> {
        self.table
            .get(&(profile, entity))
            .cloned()
            .ok_or(PipelineError::NoConverter { profile, entity })
    }

    /// Number of registered (profile, entity) pairs.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
