//! Media converter for the 5.x profile.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::ConvertError;
use crate::logging::LOG_TYPE_MEDIA_NOT_CONVERTED;
use crate::media::MediaFileRequest;

use super::{insert_translations, leftover, require_object, require_string, ConversionContext, Converter};

#[derive(Debug)]
pub struct MediaConverter;

#[async_trait]
impl Converter for MediaConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Media
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Media)?;
        let source_id = require_string(&mut fields, "id", EntityKind::Media)?;

        // A media row without a file location cannot be transferred at
        // all; degrade it to fully-unmapped instead of failing the batch.
        let uri = record::take_string(&mut fields, "uri")
            .or_else(|| record::take_string(&mut fields, "path"));
        let Some(uri) = uri else {
            ctx.logger.add_info(
                ctx.run_id(),
                EntityKind::Media,
                LOG_TYPE_MEDIA_NOT_CONVERTED,
                "Media could not be converted",
                "The media row carries no uri or path.",
                Some(json!({ "sourceId": source_id })),
            );
            return Ok(ConvertStruct::failed(raw.clone()));
        };

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Media,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let name = record::take_string(&mut fields, "name");
        let file_size = record::take_integer(&mut fields, "file_size").unwrap_or(0);
        ctx.media.save_media_file(MediaFileRequest {
            run_id: ctx.run_id(),
            uri,
            file_name: name.clone().unwrap_or_else(|| id.to_string()),
            file_size,
            media_id: id,
        });

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));

        let record_locale = record::take_string(&mut fields, "_locale");
        let mut translation = Map::new();
        if let Some(name) = name {
            translation.insert("title".to_string(), json!(name));
        }
        record::convert_value(&mut translation, "alt", &mut fields, "description", FieldType::String);
        insert_translations(&mut converted, translation, record_locale.as_deref(), ctx).await?;

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}
