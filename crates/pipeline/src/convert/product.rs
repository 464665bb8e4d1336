//! Product converter for the 5.x profile.
//!
//! The densest converter: nested manufacturer, category references
//! resolved in bulk, a media gallery, and variant children converted
//! recursively with the same rules as the parent.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::{ConvertError, StoreError};

use super::{
    convert_media, insert_translations, leftover, require_object, require_string,
    ConversionContext, Converter,
};

#[derive(Debug)]
pub struct ProductConverter;

#[async_trait]
impl Converter for ProductConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Product
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Product)?;
        let source_id = require_string(&mut fields, "id", EntityKind::Product)?;

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Product,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let record_locale = record::take_string(&mut fields, "_locale");

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        record::convert_value(&mut converted, "productNumber", &mut fields, "number", FieldType::String);
        record::convert_value(&mut converted, "stock", &mut fields, "stock", FieldType::Integer);
        record::convert_value(&mut converted, "active", &mut fields, "active", FieldType::Boolean);
        record::convert_value(&mut converted, "price", &mut fields, "price", FieldType::Float);
        record::convert_value(
            &mut converted,
            "purchasePrice",
            &mut fields,
            "price_net",
            FieldType::Float,
        );
        record::convert_value(&mut converted, "taxRate", &mut fields, "tax_rate", FieldType::Float);
        record::convert_value(&mut converted, "ean", &mut fields, "ean", FieldType::String);
        record::convert_value(&mut converted, "weight", &mut fields, "weight", FieldType::Float);

        if let Some(manufacturer) = fields.remove("manufacturer") {
            if let Some(manufacturer) =
                convert_manufacturer(manufacturer, record_locale.as_deref(), &source_id, ctx).await?
            {
                converted.insert("manufacturer".to_string(), manufacturer);
            }
        }

        if let Some(categories) = fields.remove("categories") {
            let mapped = remap_categories(categories, ctx).await?;
            if !mapped.is_empty() {
                converted.insert("categories".to_string(), Value::Array(mapped));
            }
        }

        if let Some(Value::Array(gallery)) = fields.remove("media") {
            let mut items = Vec::new();
            for (position, item) in gallery.into_iter().enumerate() {
                if let Some(media) = convert_media(
                    item,
                    record_locale.as_deref(),
                    EntityKind::Product,
                    &source_id,
                    ctx,
                )
                .await?
                {
                    items.push(json!({ "position": position as i64, "media": media }));
                }
            }
            if !items.is_empty() {
                converted.insert("media".to_string(), Value::Array(items));
            }
        }

        if let Some(Value::Array(children)) = fields.remove("children") {
            let mut variants = Vec::new();
            for child in children {
                if let Some(variant) = convert_variant(child, id, ctx).await? {
                    variants.push(variant);
                }
            }
            if !variants.is_empty() {
                converted.insert("children".to_string(), Value::Array(variants));
            }
        }

        let mut translation = Map::new();
        record::convert_value(&mut translation, "name", &mut fields, "name", FieldType::String);
        record::convert_value(
            &mut translation,
            "description",
            &mut fields,
            "description",
            FieldType::String,
        );
        record::convert_value(&mut translation, "keywords", &mut fields, "keywords", FieldType::String);
        insert_translations(&mut converted, translation, record_locale.as_deref(), ctx).await?;

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}

/// Convert the nested manufacturer: its own mapping namespace, a name
/// translation, and an optional logo image.
async fn convert_manufacturer(
    raw: Value,
    record_locale: Option<&str>,
    product_source_id: &str,
    ctx: &ConversionContext<'_>,
) -> Result<Option<Value>, ConvertError> {
    let mut fields = match raw {
        Value::Object(map) => map,
        _ => return Ok(None),
    };
    let Some(source_id) = record::take_string(&mut fields, "id") else {
        return Ok(None);
    };

    let id = ctx
        .mapping
        .create_or_get(EntityKind::Manufacturer, &source_id)
        .await?;

    let mut manufacturer = Map::new();
    manufacturer.insert("id".to_string(), json!(id.to_string()));
    record::convert_value(&mut manufacturer, "link", &mut fields, "link", FieldType::String);

    let mut translation = Map::new();
    record::convert_value(&mut translation, "name", &mut fields, "name", FieldType::String);
    record::convert_value(
        &mut translation,
        "description",
        &mut fields,
        "description",
        FieldType::String,
    );
    insert_translations(&mut manufacturer, translation, record_locale, ctx).await?;

    if let Some(media) = fields.remove("media") {
        if let Some(media) = convert_media(
            media,
            record_locale,
            EntityKind::Manufacturer,
            product_source_id,
            ctx,
        )
        .await?
        {
            manufacturer.insert("media".to_string(), media);
        }
    }

    Ok(Some(Value::Object(manufacturer)))
}

/// Resolve category references in bulk, minting placeholder mappings for
/// categories that have not been migrated yet.
async fn remap_categories(
    categories: Value,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Value>, StoreError> {
    let items = match categories {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    // References arrive either as plain ids or as `{id: ...}` objects.
    let source_ids: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => record::get_string(item, "id"),
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();

    let mut resolved = ctx
        .mapping
        .resolve_bulk(EntityKind::Category, &source_ids)
        .await?;

    let mut mapped = Vec::with_capacity(source_ids.len());
    for source_id in source_ids {
        let target = match resolved.remove(&source_id) {
            Some(uuid) => uuid,
            None => {
                ctx.mapping
                    .create_or_get(EntityKind::Category, &source_id)
                    .await?
            }
        };
        mapped.push(json!({ "id": target.to_string() }));
    }
    Ok(mapped)
}

/// Convert one variant child; children are products of their own with a
/// parent link back to the container.
async fn convert_variant(
    raw: Value,
    parent_id: Uuid,
    ctx: &ConversionContext<'_>,
) -> Result<Option<Value>, ConvertError> {
    let mut fields = match raw {
        Value::Object(map) => map,
        _ => return Ok(None),
    };
    let Some(source_id) = record::take_string(&mut fields, "id") else {
        return Ok(None);
    };

    let id = ctx
        .mapping
        .create_or_get(EntityKind::Product, &source_id)
        .await?;

    let mut variant = Map::new();
    variant.insert("id".to_string(), json!(id.to_string()));
    variant.insert("parentId".to_string(), json!(parent_id.to_string()));
    record::convert_value(&mut variant, "productNumber", &mut fields, "number", FieldType::String);
    record::convert_value(&mut variant, "stock", &mut fields, "stock", FieldType::Integer);
    record::convert_value(&mut variant, "active", &mut fields, "active", FieldType::Boolean);
    record::convert_value(&mut variant, "ean", &mut fields, "ean", FieldType::String);

    // Variant axes point at property group options.
    if let Some(Value::Array(options)) = fields.remove("options") {
        let mut mapped = Vec::new();
        for option in options {
            let source = match &option {
                Value::Object(_) => record::get_string(&option, "id"),
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            if let Some(source) = source {
                let target = ctx
                    .mapping
                    .create_or_get(EntityKind::PropertyGroupOption, &source)
                    .await?;
                mapped.push(json!({ "id": target.to_string() }));
            }
        }
        if !mapped.is_empty() {
            variant.insert("options".to_string(), Value::Array(mapped));
        }
    }

    Ok(Some(Value::Object(variant)))
}
