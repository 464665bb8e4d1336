//! Language converter for the 5.x profile.
//!
//! Languages must migrate first: every other converter resolves locale
//! codes through the language mapping namespace, so this converter keys
//! the primary mapping by normalized locale code — not by the source
//! row's numeric id — to guarantee both paths mint the same UUID.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::locale::normalize_locale;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct};

use crate::error::ConvertError;

use super::{insert_translations, leftover, require_object, require_string, ConversionContext, Converter};

#[derive(Debug)]
pub struct LanguageConverter;

#[async_trait]
impl Converter for LanguageConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Language
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Language)?;
        let locale = require_string(&mut fields, "locale", EntityKind::Language)?;
        let locale = normalize_locale(&locale);
        fields.remove("id");

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Language,
                &locale,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        converted.insert("localeCode".to_string(), json!(locale));

        let record_locale = record::take_string(&mut fields, "_locale");
        let mut translation = Map::new();
        record::convert_value(
            &mut translation,
            "name",
            &mut fields,
            "name",
            record::FieldType::String,
        );
        insert_translations(&mut converted, translation, record_locale.as_deref(), ctx).await?;

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}
