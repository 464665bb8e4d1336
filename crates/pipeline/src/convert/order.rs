//! Order converter for the 5.x profile.
//!
//! Orders are migrated last, yet their line items may still reference
//! products that failed or were paged into a later batch — those
//! references resolve to placeholder mappings rather than failing the
//! order.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::ConvertError;

use super::{leftover, remap_id_field, require_object, require_string, ConversionContext, Converter};

#[derive(Debug)]
pub struct OrderConverter;

#[async_trait]
impl Converter for OrderConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Order
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Order)?;
        let source_id = require_string(&mut fields, "id", EntityKind::Order)?;
        // An order must belong to a customer; everything else degrades.
        let customer_source_id = require_string(&mut fields, "customer_id", EntityKind::Order)?;

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Order,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;
        let customer_id = ctx
            .mapping
            .create_or_get(EntityKind::Customer, &customer_source_id)
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        converted.insert("customerId".to_string(), json!(customer_id.to_string()));
        record::convert_value(&mut converted, "orderNumber", &mut fields, "ordernumber", FieldType::String);
        record::convert_value(&mut converted, "orderDate", &mut fields, "order_time", FieldType::String);
        record::convert_value(
            &mut converted,
            "amountTotal",
            &mut fields,
            "invoice_amount",
            FieldType::Float,
        );
        record::convert_value(
            &mut converted,
            "shippingTotal",
            &mut fields,
            "invoice_shipping",
            FieldType::Float,
        );

        // The currency reference is its ISO code, same key the currency
        // converter maps under.
        remap_id_field(
            &mut converted,
            "currencyId",
            &mut fields,
            "currency",
            EntityKind::Currency,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "paymentMethodId",
            &mut fields,
            "payment_id",
            EntityKind::PaymentMethod,
            ctx.mapping,
        )
        .await?;
        remap_id_field(
            &mut converted,
            "shippingMethodId",
            &mut fields,
            "dispatch_id",
            EntityKind::ShippingMethod,
            ctx.mapping,
        )
        .await?;

        if let Some(Value::Array(details)) = fields.remove("details") {
            let mut line_items = Vec::new();
            for detail in details {
                if let Some(item) = convert_line_item(detail, ctx).await? {
                    line_items.push(item);
                }
            }
            if !line_items.is_empty() {
                converted.insert("lineItems".to_string(), Value::Array(line_items));
            }
        }

        let mut addresses = Vec::new();
        if let Some(billing) = fields.remove("billingaddress") {
            if let Some((address, address_id)) = convert_order_address(billing, ctx).await? {
                converted.insert("billingAddressId".to_string(), json!(address_id));
                addresses.push(address);
            }
        }
        if let Some(shipping) = fields.remove("shippingaddress") {
            if let Some((address, address_id)) = convert_order_address(shipping, ctx).await? {
                converted.insert("shippingAddressId".to_string(), json!(address_id));
                addresses.push(address);
            }
        }
        if !addresses.is_empty() {
            converted.insert("addresses".to_string(), Value::Array(addresses));
        }

        fields.remove("_locale");

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}

/// Convert one order position; its product reference is forward-safe.
async fn convert_line_item(
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
        .create_or_get(EntityKind::OrderLineItem, &source_id)
        .await?;

    let mut item = Map::new();
    item.insert("id".to_string(), json!(id.to_string()));
    record::convert_value(&mut item, "label", &mut fields, "name", FieldType::String);
    record::convert_value(&mut item, "quantity", &mut fields, "quantity", FieldType::Integer);
    record::convert_value(&mut item, "unitPrice", &mut fields, "price", FieldType::Float);

    remap_id_field(
        &mut item,
        "productId",
        &mut fields,
        "article_id",
        EntityKind::Product,
        ctx.mapping,
    )
    .await?;

    Ok(Some(Value::Object(item)))
}

/// Convert one order address, returning the address object and its
/// target id for the billing/shipping wiring on the order.
async fn convert_order_address(
    raw: Value,
    ctx: &ConversionContext<'_>,
) -> Result<Option<(Value, String)>, ConvertError> {
    let mut fields = match raw {
        Value::Object(map) => map,
        _ => return Ok(None),
    };
    let Some(source_id) = record::take_string(&mut fields, "id") else {
        return Ok(None);
    };

    let id = ctx
        .mapping
        .create_or_get(EntityKind::OrderAddress, &source_id)
        .await?;

    let mut address = Map::new();
    address.insert("id".to_string(), json!(id.to_string()));
    record::convert_value(&mut address, "firstName", &mut fields, "firstname", FieldType::String);
    record::convert_value(&mut address, "lastName", &mut fields, "lastname", FieldType::String);
    record::convert_value(&mut address, "company", &mut fields, "company", FieldType::String);
    record::convert_value(&mut address, "street", &mut fields, "street", FieldType::String);
    record::convert_value(&mut address, "zipcode", &mut fields, "zipcode", FieldType::String);
    record::convert_value(&mut address, "city", &mut fields, "city", FieldType::String);

    remap_id_field(
        &mut address,
        "countryId",
        &mut fields,
        "country_id",
        EntityKind::Country,
        ctx.mapping,
    )
    .await?;

    let id_string = id.to_string();
    Ok(Some((Value::Object(address), id_string)))
}
