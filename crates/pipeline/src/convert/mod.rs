//! Entity converters.
//!
//! One converter variant per (profile, entity) pair. All variants share
//! the same algorithm shape: resolve the record's own identifier through
//! the mapping service, resolve every foreign-key-shaped field the same
//! way (allocating placeholder mappings for parents that have not been
//! migrated yet), fan translatable fields out into a translations map
//! keyed by resolved language id, recurse into nested collections, and
//! stage embedded media for transfer.
//!
//! Converters never throw for plain data-quality gaps — a missing
//! optional field just stays out of the converted record or remains in
//! the unmapped remainder. Only structurally broken records (required
//! key absent) produce a [`ConvertError`].

pub mod category;
pub mod cms_page;
pub mod currency;
pub mod customer;
pub mod language;
pub mod media;
pub mod order;
pub mod product;
pub mod property_group_option;
pub mod sales_channel;

pub use category::CategoryConverter;
pub use cms_page::CmsPageConverter;
pub use currency::CurrencyConverter;
pub use customer::CustomerConverter;
pub use language::LanguageConverter;
pub use media::MediaConverter;
pub use order::OrderConverter;
pub use product::ProductConverter;
pub use property_group_option::PropertyGroupOptionConverter;
pub use sales_channel::SalesChannelConverter;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use portage_core::context::MigrationContext;
use portage_core::entity::EntityKind;
use portage_core::locale::normalize_locale;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::{ConvertError, StoreError};
use crate::logging::{LoggingService, LOG_TYPE_MEDIA_NOT_CONVERTED};
use crate::mapping::MappingService;
use crate::media::{MediaFileRequest, MediaFileService};

/// Per-batch state threaded through every conversion step.
///
/// Built by the orchestrator for one batch and passed by reference; the
/// converters themselves stay stateless.
pub struct ConversionContext<'a> {
    pub migration: &'a MigrationContext,
    pub mapping: &'a MappingService,
    pub media: &'a dyn MediaFileService,
    pub logger: &'a dyn LoggingService,
    pub default_locale: String,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        migration: &'a MigrationContext,
        mapping: &'a MappingService,
        media: &'a dyn MediaFileService,
        logger: &'a dyn LoggingService,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            migration,
            mapping,
            media,
            logger,
            default_locale: normalize_locale(&default_locale.into()),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.migration.run_id
    }

    pub fn connection_id(&self) -> Uuid {
        self.migration.connection_id
    }

    /// Target language id for a locale code; the language mapping is
    /// keyed by normalized locale, so this is idempotent across entities.
    pub async fn language_id(&self, locale: &str) -> Result<Uuid, StoreError> {
        self.mapping
            .create_or_get(EntityKind::Language, &normalize_locale(locale))
            .await
    }

    /// Target language id of the shop default locale.
    pub async fn default_language_id(&self) -> Result<Uuid, StoreError> {
        let locale = self.default_locale.clone();
        self.language_id(&locale).await
    }

    /// Language id a record's translatable fields belong under: the
    /// record's own locale when it carries a non-default one, the shop
    /// default otherwise.
    pub async fn translation_language_id(
        &self,
        record_locale: Option<&str>,
    ) -> Result<Uuid, StoreError> {
        match record_locale {
            Some(locale) if normalize_locale(locale) != self.default_locale => {
                self.language_id(locale).await
            }
            _ => self.default_language_id().await,
        }
    }
}

/// One conversion strategy for one (profile, entity) pair.
#[async_trait]
pub trait Converter: Send + Sync + std::fmt::Debug {
    /// Static dispatch predicate; must not inspect record contents.
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool;

    /// Transform one raw record into a [`ConvertStruct`].
    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError>;

    /// Persist the mappings created while converting this batch.
    /// Delegates to the mapping service; the orchestrator calls this
    /// exactly once per batch, after the last record.
    async fn write_mapping(&self, ctx: &ConversionContext<'_>) -> Result<usize, StoreError> {
        ctx.mapping.flush().await
    }
}

/// Every converter variant shipped with the pipeline.
pub fn all_converters() -> Vec<Arc<dyn Converter>> {
    vec![
        Arc::new(LanguageConverter),
        Arc::new(CurrencyConverter),
        Arc::new(CategoryConverter),
        Arc::new(MediaConverter),
        Arc::new(PropertyGroupOptionConverter),
        Arc::new(ProductConverter),
        Arc::new(CustomerConverter),
        Arc::new(OrderConverter),
        Arc::new(CmsPageConverter),
        Arc::new(SalesChannelConverter),
    ]
}

// ---------------------------------------------------------------------------
// Shared conversion helpers
// ---------------------------------------------------------------------------

/// The raw record as a mutable field map; converters consume fields out
/// of this copy and whatever remains becomes the unmapped part.
pub(crate) fn require_object(
    raw: &Value,
    entity: EntityKind,
) -> Result<Map<String, Value>, ConvertError> {
    raw.as_object()
        .cloned()
        .ok_or(ConvertError::NotAnObject { entity })
}

/// Consume a structurally required string field.
pub(crate) fn require_string(
    fields: &mut Map<String, Value>,
    field: &'static str,
    entity: EntityKind,
) -> Result<String, ConvertError> {
    record::take_string(fields, field).ok_or(ConvertError::MissingField { entity, field })
}

/// Whatever the converter did not consume, or `None` when everything was
/// interpreted.
pub(crate) fn leftover(fields: Map<String, Value>) -> Option<Value> {
    if fields.is_empty() {
        None
    } else {
        Some(Value::Object(fields))
    }
}

/// Consume a foreign-key field and rewrite it to the mapped target id,
/// allocating a placeholder mapping when the referenced entity has not
/// been migrated yet.
pub(crate) async fn remap_id_field(
    converted: &mut Map<String, Value>,
    target_key: &str,
    fields: &mut Map<String, Value>,
    source_key: &str,
    entity: EntityKind,
    mapping: &MappingService,
) -> Result<Option<Uuid>, StoreError> {
    let Some(source_id) = record::take_string(fields, source_key) else {
        return Ok(None);
    };
    let target = mapping.create_or_get(entity, &source_id).await?;
    converted.insert(target_key.to_string(), json!(target.to_string()));
    Ok(Some(target))
}

/// Rewrite the `key` field of every object in an association list to its
/// mapped target id. Returns the rewritten copy.
pub(crate) async fn remap_association_ids(
    items: Vec<Value>,
    key: &str,
    entity: EntityKind,
    mapping: &MappingService,
) -> Result<Vec<Value>, StoreError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let mut item = match item {
            Value::Object(map) => map,
            other => {
                out.push(other);
                continue;
            }
        };
        if let Some(old) = record::take_string(&mut item, key) {
            let mapped = mapping.create_or_get(entity, &old).await?;
            item.insert(key.to_string(), json!(mapped.to_string()));
        }
        out.push(Value::Object(item));
    }
    Ok(out)
}

/// Attach a translations map to a converted record, keyed by the resolved
/// language id for the record's locale.
pub(crate) async fn insert_translations(
    converted: &mut Map<String, Value>,
    translation: Map<String, Value>,
    record_locale: Option<&str>,
    ctx: &ConversionContext<'_>,
) -> Result<(), StoreError> {
    if translation.is_empty() {
        return Ok(());
    }
    let language_id = ctx.translation_language_id(record_locale).await?;
    let mut translations = Map::new();
    translations.insert(language_id.to_string(), Value::Object(translation));
    converted.insert("translations".to_string(), Value::Object(translations));
    Ok(())
}

/// Convert an embedded media reference: mint the target media id, stage
/// the binary transfer, and return the rewritten media object.
///
/// A reference without an id or file location cannot be converted; it is
/// logged against the owning record and dropped (`None`).
pub(crate) async fn convert_media(
    raw_media: Value,
    record_locale: Option<&str>,
    owner_entity: EntityKind,
    owner_source_id: &str,
    ctx: &ConversionContext<'_>,
) -> Result<Option<Value>, ConvertError> {
    let mut fields = match raw_media {
        Value::Object(map) => map,
        _ => return Ok(None),
    };

    let Some(media_source_id) = record::take_string(&mut fields, "id") else {
        ctx.logger.add_info(
            ctx.run_id(),
            owner_entity,
            LOG_TYPE_MEDIA_NOT_CONVERTED,
            &format!("{owner_entity} media could not be converted"),
            "The media reference carries no source id.",
            Some(json!({ "sourceId": owner_source_id })),
        );
        return Ok(None);
    };

    let uri = record::take_string(&mut fields, "uri")
        .or_else(|| record::take_string(&mut fields, "path"));
    let Some(uri) = uri else {
        ctx.logger.add_info(
            ctx.run_id(),
            owner_entity,
            LOG_TYPE_MEDIA_NOT_CONVERTED,
            &format!("{owner_entity} media could not be converted"),
            "The media reference carries no uri or path.",
            Some(json!({ "sourceId": owner_source_id, "mediaId": media_source_id })),
        );
        return Ok(None);
    };

    let media_id = ctx
        .mapping
        .create_or_get(EntityKind::Media, &media_source_id)
        .await?;
    let name = record::take_string(&mut fields, "name");
    let file_size = record::take_integer(&mut fields, "file_size").unwrap_or(0);

    ctx.media.save_media_file(MediaFileRequest {
        run_id: ctx.run_id(),
        uri,
        file_name: name.clone().unwrap_or_else(|| media_id.to_string()),
        file_size,
        media_id,
    });

    let mut media = Map::new();
    media.insert("id".to_string(), json!(media_id.to_string()));

    let mut translation = Map::new();
    if let Some(name) = name {
        translation.insert("title".to_string(), json!(name));
    }
    record::convert_value(&mut translation, "alt", &mut fields, "description", FieldType::String);
    insert_translations(&mut media, translation, record_locale, ctx).await?;

    Ok(Some(Value::Object(media)))
}
