//! Currency converter for the 5.x profile.
//!
//! Keyed by ISO code, which is also how orders reference their currency.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::ConvertError;

use super::{insert_translations, leftover, require_object, require_string, ConversionContext, Converter};

#[derive(Debug)]
pub struct CurrencyConverter;

#[async_trait]
impl Converter for CurrencyConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Currency
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Currency)?;
        let iso_code = require_string(&mut fields, "currency", EntityKind::Currency)?;
        fields.remove("id");

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Currency,
                &iso_code,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));
        converted.insert("isoCode".to_string(), json!(iso_code.clone()));
        record::convert_value(&mut converted, "factor", &mut fields, "factor", FieldType::Float);
        record::convert_value(&mut converted, "symbol", &mut fields, "symbol", FieldType::String);
        record::convert_value(&mut converted, "position", &mut fields, "position", FieldType::Integer);
        record::convert_value(
            &mut converted,
            "isSystemDefault",
            &mut fields,
            "standard",
            FieldType::Boolean,
        );

        let record_locale = record::take_string(&mut fields, "_locale");
        let mut translation = Map::new();
        record::convert_value(&mut translation, "name", &mut fields, "name", FieldType::String);
        translation.insert("shortName".to_string(), json!(iso_code));
        insert_translations(&mut converted, translation, record_locale.as_deref(), ctx).await?;

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}
