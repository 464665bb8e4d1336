//! Customer converter for the 5.x profile.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::ConvertError;

use super::{leftover, remap_id_field, require_object, require_string, ConversionContext, Converter};

#[derive(Debug)]
pub struct CustomerConverter;

#[async_trait]
impl Converter for CustomerConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Customer
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Customer)?;
        let source_id = require_string(&mut fields, "id", EntityKind::Customer)?;
        // An account without an email cannot log in anywhere; structural.
        let email = require_string(&mut fields, "email", EntityKind::Customer)?;

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Customer,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        converted.insert("email".to_string(), json!(email));
        record::convert_value(&mut converted, "firstName", &mut fields, "firstname", FieldType::String);
        record::convert_value(&mut converted, "lastName", &mut fields, "lastname", FieldType::String);
        record::convert_value(
            &mut converted,
            "customerNumber",
            &mut fields,
            "customernumber",
            FieldType::String,
        );
        record::convert_value(&mut converted, "active", &mut fields, "active", FieldType::Boolean);

        remap_id_field(
            &mut converted,
            "groupId",
            &mut fields,
            "customergroup",
            EntityKind::CustomerGroup,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "defaultPaymentMethodId",
            &mut fields,
            "defaultpayment",
            EntityKind::PaymentMethod,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "salutationId",
            &mut fields,
            "salutation",
            EntityKind::Salutation,
            ctx.mapping,
        )
        .await?;

        if let Some(Value::Array(addresses)) = fields.remove("addresses") {
            let mut mapped = Vec::new();
            for address in addresses {
                if let Some(address) = convert_address(address, ctx).await? {
                    mapped.push(address);
                }
            }
            if !mapped.is_empty() {
                converted.insert("addresses".to_string(), Value::Array(mapped));
            }
        }

        remap_id_field(
            &mut converted,
            "defaultBillingAddressId",
            &mut fields,
            "default_billing_address_id",
            EntityKind::CustomerAddress,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "defaultShippingAddressId",
            &mut fields,
            "default_shipping_address_id",
            EntityKind::CustomerAddress,
            ctx.mapping,
        )
        .await?;

        fields.remove("_locale");

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}

/// Convert one customer address, remapping its country reference.
async fn convert_address(
    raw: Value,
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
        .create_or_get(EntityKind::CustomerAddress, &source_id)
        .await?;

    let mut address = Map::new();
    address.insert("id".to_string(), json!(id.to_string()));
    record::convert_value(&mut address, "firstName", &mut fields, "firstname", FieldType::String);
    record::convert_value(&mut address, "lastName", &mut fields, "lastname", FieldType::String);
    record::convert_value(&mut address, "company", &mut fields, "company", FieldType::String);
    record::convert_value(&mut address, "street", &mut fields, "street", FieldType::String);
    record::convert_value(&mut address, "zipcode", &mut fields, "zipcode", FieldType::String);
    record::convert_value(&mut address, "city", &mut fields, "city", FieldType::String);
    record::convert_value(&mut address, "phoneNumber", &mut fields, "phone", FieldType::String);

    remap_id_field(
        &mut address,
        "countryId",
        &mut fields,
        "country_id",
        EntityKind::Country,
        ctx.mapping,
    )
    .await?;

    Ok(Some(Value::Object(address)))
}
