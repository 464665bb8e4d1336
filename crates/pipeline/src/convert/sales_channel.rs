//! Sales channel converter for the structured 6.x profile.
//!
//! A sales channel is mostly references: association lists, domain
//! bindings, and a row of singular foreign keys. Each one is remapped;
//! the channel lands deactivated so an operator flips it on only after
//! verifying the migrated wiring.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct};

use crate::error::ConvertError;

use super::{
    leftover, remap_association_ids, remap_id_field, require_object, require_string,
    ConversionContext, Converter,
};

#[derive(Debug)]
pub struct SalesChannelConverter;

#[async_trait]
impl Converter for SalesChannelConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop6 && entity == EntityKind::SalesChannel
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::SalesChannel)?;
        let source_id = require_string(&mut fields, "id", EntityKind::SalesChannel)?;

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::SalesChannel,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        record::convert_value(
            &mut converted,
            "name",
            &mut fields,
            "name",
            record::FieldType::String,
        );

        for (key, entity) in [
            ("countries", EntityKind::Country),
            ("currencies", EntityKind::Currency),
            ("languages", EntityKind::Language),
            ("paymentMethods", EntityKind::PaymentMethod),
            ("shippingMethods", EntityKind::ShippingMethod),
        ] {
            if let Some(Value::Array(items)) = fields.remove(key) {
                let items = remap_association_ids(items, "id", entity, ctx.mapping).await?;
                converted.insert(key.to_string(), Value::Array(items));
            }
        }

        if let Some(Value::Array(translations)) = fields.remove("translations") {
            let translations =
                remap_association_ids(translations, "languageId", EntityKind::Language, ctx.mapping)
                    .await?;
            converted.insert("translations".to_string(), Value::Array(translations));
        }

        if let Some(Value::Array(domains)) = fields.remove("domains") {
            let domains =
                remap_association_ids(domains, "languageId", EntityKind::Language, ctx.mapping)
                    .await?;
            let domains =
                remap_association_ids(domains, "currencyId", EntityKind::Currency, ctx.mapping)
                    .await?;
            let domains =
                remap_association_ids(domains, "snippetSetId", EntityKind::SnippetSet, ctx.mapping)
                    .await?;
            converted.insert("domains".to_string(), Value::Array(domains));
        }

        remap_id_field(
            &mut converted,
            "customerGroupId",
            &mut fields,
            "customerGroupId",
            EntityKind::CustomerGroup,
            ctx.mapping,
        )
        .await?;
        for key in ["navigationCategoryId", "footerCategoryId", "serviceCategoryId"] {
            remap_id_field(&mut converted, key, &mut fields, key, EntityKind::Category, ctx.mapping)
                .await?;
        }
        remap_id_field(
            &mut converted,
            "languageId",
            &mut fields,
            "languageId",
            EntityKind::Language,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "currencyId",
            &mut fields,
            "currencyId",
            EntityKind::Currency,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "paymentMethodId",
            &mut fields,
            "paymentMethodId",
            EntityKind::PaymentMethod,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "shippingMethodId",
            &mut fields,
            "shippingMethodId",
            EntityKind::ShippingMethod,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "countryId",
            &mut fields,
            "countryId",
            EntityKind::Country,
            ctx.mapping,
        )
        .await?;

        // Migrated channels start offline.
        converted.insert("active".to_string(), json!(false));
        fields.remove("active");

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}
