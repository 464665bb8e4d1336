//! CMS page converter for the structured 6.x profile.
//!
//! Pages arrive already shaped for the target schema; the work here is
//! re-identification: the page id, every language reference inside the
//! translations, and every media reference buried in the
//! sections → blocks → slots tree get remapped. The tree is walked over
//! a copy and reassembled, never mutated through shared references.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct};

use crate::error::ConvertError;
use crate::logging::LOG_TYPE_SKIPPED;

use super::{
    leftover, remap_association_ids, remap_id_field, require_object, require_string,
    ConversionContext, Converter,
};

#[derive(Debug)]
pub struct CmsPageConverter;

#[async_trait]
impl Converter for CmsPageConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop6 && entity == EntityKind::CmsPage
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::CmsPage)?;
        let source_id = require_string(&mut fields, "id", EntityKind::CmsPage)?;

        // Locked system layouts already exist on the target; migrating a
        // copy would shadow them. Skip the record and keep it unmapped.
        if fields.get("locked").and_then(Value::as_bool) == Some(true) {
            ctx.logger.add_info(
                ctx.run_id(),
                EntityKind::CmsPage,
                LOG_TYPE_SKIPPED,
                "Locked layout not migrated",
                "Locked default layouts are provided by the target system.",
                Some(json!({ "sourceId": source_id })),
            );
            return Ok(ConvertStruct::failed(raw.clone()));
        }

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::CmsPage,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        record::convert_value(
            &mut converted,
            "type",
            &mut fields,
            "type",
            record::FieldType::String,
        );

        if let Some(Value::Array(translations)) = fields.remove("translations") {
            let translations =
                remap_association_ids(translations, "languageId", EntityKind::Language, ctx.mapping)
                    .await?;
            converted.insert("translations".to_string(), Value::Array(translations));
        }

        remap_id_field(
            &mut converted,
            "previewMediaId",
            &mut fields,
            "previewMediaId",
            EntityKind::Media,
            ctx.mapping,
        )
        .await?;

        if let Some(Value::Array(sections)) = fields.remove("sections") {
            let sections = convert_sections(sections, ctx).await?;
            converted.insert("sections".to_string(), Value::Array(sections));
        }

        if let Some(Value::Array(categories)) = fields.remove("categories") {
            let categories =
                remap_association_ids(categories, "id", EntityKind::Category, ctx.mapping).await?;
            converted.insert("categories".to_string(), Value::Array(categories));
        }

        fields.remove("locked");

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}

/// Walk the section level of the layout tree.
async fn convert_sections(
    sections: Vec<Value>,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Value>, ConvertError> {
    let mut out = Vec::with_capacity(sections.len());
    for section in sections {
        let mut section = match section {
            Value::Object(map) => map,
            other => {
                out.push(other);
                continue;
            }
        };
        remap_background_media(&mut section, ctx).await?;
        if let Some(Value::Array(blocks)) = section.remove("blocks") {
            let blocks = convert_blocks(blocks, ctx).await?;
            section.insert("blocks".to_string(), Value::Array(blocks));
        }
        out.push(Value::Object(section));
    }
    Ok(out)
}

/// Walk the block level of the layout tree.
async fn convert_blocks(
    blocks: Vec<Value>,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Value>, ConvertError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut block = match block {
            Value::Object(map) => map,
            other => {
                out.push(other);
                continue;
            }
        };
        remap_background_media(&mut block, ctx).await?;
        if let Some(Value::Array(slots)) = block.remove("slots") {
            let slots = convert_slots(slots, ctx).await?;
            block.insert("slots".to_string(), Value::Array(slots));
        }
        out.push(Value::Object(block));
    }
    Ok(out)
}

/// Walk the slot level of the layout tree.
async fn convert_slots(
    slots: Vec<Value>,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Value>, ConvertError> {
    let mut out = Vec::with_capacity(slots.len());
    for slot in slots {
        let mut slot = match slot {
            Value::Object(map) => map,
            other => {
                out.push(other);
                continue;
            }
        };
        remap_background_media(&mut slot, ctx).await?;
        if let Some(Value::Array(translations)) = slot.remove("translations") {
            let translations =
                remap_association_ids(translations, "languageId", EntityKind::Language, ctx.mapping)
                    .await?;
            slot.insert("translations".to_string(), Value::Array(translations));
        }
        out.push(Value::Object(slot));
    }
    Ok(out)
}

/// Remap a node's `backgroundMediaId` when present.
async fn remap_background_media(
    node: &mut Map<String, Value>,
    ctx: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    if let Some(old) = record::take_string(node, "backgroundMediaId") {
        let mapped = ctx.mapping.create_or_get(EntityKind::Media, &old).await?;
        node.insert("backgroundMediaId".to_string(), json!(mapped.to_string()));
    }
    Ok(())
}
