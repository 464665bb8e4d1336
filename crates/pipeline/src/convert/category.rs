//! Category converter for the 5.x profile.
//!
//! Source rows carry a materialized ancestor path (`"1|5|12"`) next to an
//! explicit parent id. The parent mapping is resolved forward-safely: a
//! child may migrate before its parent, in which case the parent's UUID
//! is minted here as a placeholder and reused by the parent's own
//! conversion later.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use portage_core::checksum::record_checksum;
use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_core::record::{self, ConvertStruct, FieldType};

use crate::error::ConvertError;

use super::{
    convert_media, insert_translations, leftover, remap_id_field, require_object, require_string,
    ConversionContext, Converter,
};

#[derive(Debug)]
pub struct CategoryConverter;

#[async_trait]
impl Converter for CategoryConverter {
    fn supports(&self, profile: Profile, entity: EntityKind) -> bool {
        profile == Profile::Shop5 && entity == EntityKind::Category
    }

    async fn convert(
        &self,
        raw: &Value,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConvertStruct, ConvertError> {
        let mut fields = require_object(raw, EntityKind::Category)?;
        let source_id = require_string(&mut fields, "id", EntityKind::Category)?;

        let id = ctx
            .mapping
            .create_or_get_with(
                EntityKind::Category,
                &source_id,
                Some(record_checksum(raw)),
                None,
            )
            .await?;

        let mut converted = Map::new();
        converted.insert("id".to_string(), json!(id.to_string()));

        // Explicit parent wins; otherwise fall back to the second-to-last
        // path segment. Roots have neither.
        let path = record::take_string(&mut fields, "path");
        let parent = record::take_string(&mut fields, "parent")
            .or_else(|| parent_from_path(path.as_deref(), &source_id));
        if let Some(parent) = parent {
            let parent_id = ctx
                .mapping
                .create_or_get(EntityKind::Category, &parent)
                .await?;
            converted.insert("parentId".to_string(), json!(parent_id.to_string()));
        }

        record::convert_value(&mut converted, "position", &mut fields, "position", FieldType::Integer);
        record::convert_value(&mut converted, "active", &mut fields, "active", FieldType::Boolean);

        let record_locale = record::take_string(&mut fields, "_locale");
        let mut translation = Map::new();
        record::convert_value(&mut translation, "name", &mut fields, "name", FieldType::String);
        record::convert_value(
            &mut translation,
            "description",
            &mut fields,
            "description",
            FieldType::String,
        );
        record::convert_value(
            &mut translation,
            "metaTitle",
            &mut fields,
            "meta_title",
            FieldType::String,
        );
        record::convert_value(
            &mut translation,
            "metaDescription",
            &mut fields,
            "meta_description",
            FieldType::String,
        );
        insert_translations(&mut converted, translation, record_locale.as_deref(), ctx).await?;

        if let Some(media) = fields.remove("media") {
            if let Some(media) =
                convert_media(media, record_locale.as_deref(), EntityKind::Category, &source_id, ctx)
                    .await?
            {
                converted.insert("media".to_string(), media);
            }
        }

        // The cms page a category renders with, when the source already
        // links one.
        remap_id_field(
            &mut converted,
            "cmsPageId",
            &mut fields,
            "cms_page_id",
            EntityKind::CmsPage,
            ctx.mapping,
        )
        .await?;

        Ok(ConvertStruct::with_mapping(
            Value::Object(converted),
            leftover(fields),
            id,
        ))
    }
}

/// Second-to-last segment of a materialized path, skipping the record's
/// own id when the path includes it.
fn parent_from_path(path: Option<&str>, own_id: &str) -> Option<String> {
    let segments: Vec<&str> = path?.split('|').filter(|s| !s.is_empty()).collect();
    let mut ancestors = segments.as_slice();
    if ancestors.last() == Some(&own_id) {
        ancestors = &ancestors[..ancestors.len() - 1];
    }
    ancestors.last().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_from_path_skips_own_id() {
        assert_eq!(parent_from_path(Some("1|5|12"), "12"), Some("5".to_string()));
    }

    #[test]
    fn parent_from_path_without_own_id() {
        assert_eq!(parent_from_path(Some("1|5"), "12"), Some("5".to_string()));
    }

    #[test]
    fn parent_from_path_root_returns_none() {
        assert_eq!(parent_from_path(Some("12"), "12"), None);
        assert_eq!(parent_from_path(Some(""), "12"), None);
        assert_eq!(parent_from_path(None, "12"), None);
    }
}
