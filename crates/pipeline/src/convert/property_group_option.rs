//! Property group option converter for the 5.x profile.
//!
//! Source rows nest the owning group inside the option; both sides get
//! their own mapping so products can reference either.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::ConvertError;

use super::{
    convert_media, insert_translations, leftover, require_object, require_string,
    ConversionContext, Converter,
};

#[derive(Debug)]
pub struct PropertyGroupOptionConverter;

#[async_trait]
impl Converter for PropertyGroupOptionConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::PropertyGroupOption
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::PropertyGroupOption)?;
        let source_id = require_string(&mut fields, "id", EntityKind::PropertyGroupOption)?;

        // The owning group is structurally required.
        let mut group_fields = match fields.remove("group") {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(ConvertError::MissingField {
                    entity: EntityKind::PropertyGroupOption,
                    field: "group",
                })
            }
        };
        let group_source_id =
            require_string(&mut group_fields, "id", EntityKind::PropertyGroup)?;

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::PropertyGroupOption,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;
        let group_id = ctx
            .mapping
            .create_or_get(EntityKind::PropertyGroup, &group_source_id)
            .await?;

        let record_locale = record::take_string(&mut fields, "_locale");

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));

        let mut group = Map::new();
        group.insert("id".to_string(), json!(group_id.to_string()));
        let mut group_translation = Map::new();
        record::convert_value(&mut group_translation, "name", &mut group_fields, "name", FieldType::String);
        record::convert_value(
            &mut group_translation,
            "description",
            &mut group_fields,
            "description",
            FieldType::String,
        );
        insert_translations(&mut group, group_translation, record_locale.as_deref(), ctx).await?;
        converted.insert("group".to_string(), Value::Object(group));

        let mut translation = Map::new();
        record::convert_value(&mut translation, "name", &mut fields, "name", FieldType::String);
        record::convert_value(&mut translation, "position", &mut fields, "position", FieldType::Integer);
        insert_translations(&mut converted, translation, record_locale.as_deref(), ctx).await?;

        if let Some(media) = fields.remove("media") {
            if let Some(media) = convert_media(
                media,
                record_locale.as_deref(),
                EntityKind::PropertyGroupOption,
                &source_id,
                ctx,
            )
            .await?
            {
                converted.insert("media".to_string(), media);
            }
        }

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}
