//! Converter behavior against the in-memory mapping store: reference
//! remapping, locale fan-out, nested collections, media staging, and
//! degradation rules.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{uuid_field, Harness, LOCALE};
use serde_json::json;

use portage_core::entity::EntityKind;
use portage_core::profile::Profile;
use portage_pipeline::convert::{
    CategoryConverter, CmsPageConverter, Converter, CurrencyConverter, CustomerConverter,
    LanguageConverter, MediaConverter, OrderConverter, ProductConverter,
    PropertyGroupOptionConverter, SalesChannelConverter,
};
use portage_pipeline::error::ConvertError;
use portage_pipeline::logging::{LoggingService, LOG_TYPE_MEDIA_NOT_CONVERTED, LOG_TYPE_SKIPPED};
use portage_pipeline::media::MediaFileService;

// ---------------------------------------------------------------------------
// Category (the end-to-end scenario)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn category_conversion_end_to_end() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);
    let ctx = h.context(&migration);

    let raw = json!({
        "id": "12",
        "path": "1|5|12",
        "parent": "5",
        "name": "Shoes",
        "_locale": "en-GB"
    });
    let result = CategoryConverter.convert(&raw, &ctx).await.unwrap();
    let converted = result.converted.clone().unwrap();

    // A freshly minted UUID for the record itself, reported as the
    // primary mapping reference.
    let id = uuid_field(&converted, "id");
    assert_eq!(result.primary_mapping_ref, Some(id));

    // The parent reference resolves to the same UUID the parent's own
    // conversion will use.
    let parent_id = uuid_field(&converted, "parentId");
    assert_eq!(
        h.mapping
            .resolve(EntityKind::Category, "5")
            .await
            .unwrap(),
        Some(parent_id)
    );

    // The name landed in the translations entry for the default language.
    let language_id = h
        .mapping
        .resolve(EntityKind::Language, LOCALE)
        .await
        .unwrap()
        .unwrap();
    let key = language_id.to_string();
    assert_eq!(converted["translations"][key.as_str()]["name"], "Shoes");

    // Everything was interpreted.
    assert!(result.unmapped.is_none());
}

#[tokio::test]
async fn category_id_is_stable_across_runs() {
    let h = Harness::new();
    let raw = json!({"id": "12", "path": "1|5|12", "parent": "5", "name": "Shoes", "_locale": "en-GB"});

    let migration = h.migration(Profile::Shop5, EntityKind::Category);
    let first = CategoryConverter
        .convert(&raw, &h.context(&migration))
        .await
        .unwrap();
    h.mapping.flush().await.unwrap();

    let second_run = Harness::with_store(h.connection_id, Arc::clone(&h.store));
    let migration = second_run.migration(Profile::Shop5, EntityKind::Category);
    let second = CategoryConverter
        .convert(&raw, &second_run.context(&migration))
        .await
        .unwrap();

    assert_eq!(
        uuid_field(&first.converted.unwrap(), "id"),
        uuid_field(&second.converted.unwrap(), "id")
    );
}

#[tokio::test]
async fn category_parent_falls_back_to_path() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);
    let ctx = h.context(&migration);

    let raw = json!({"id": "12", "path": "1|5|12", "name": "Shoes", "_locale": "en-GB"});
    let result = CategoryConverter.convert(&raw, &ctx).await.unwrap();

    let parent_id = uuid_field(&result.converted.unwrap(), "parentId");
    assert_eq!(
        h.mapping.resolve(EntityKind::Category, "5").await.unwrap(),
        Some(parent_id)
    );
}

#[tokio::test]
async fn category_without_id_is_structural() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);
    let ctx = h.context(&migration);

    let error = CategoryConverter
        .convert(&json!({"name": "Shoes"}), &ctx)
        .await
        .unwrap_err();
    assert_matches!(
        error,
        ConvertError::MissingField {
            entity: EntityKind::Category,
            field: "id",
        }
    );
}

#[tokio::test]
async fn unconsumed_fields_stay_unmapped() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);
    let ctx = h.context(&migration);

    let raw = json!({"id": "12", "name": "Shoes", "legacy_flag": 7, "_locale": "en-GB"});
    let result = CategoryConverter.convert(&raw, &ctx).await.unwrap();

    assert_eq!(result.unmapped, Some(json!({"legacy_flag": 7})));
}

// ---------------------------------------------------------------------------
// Locale fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_default_locale_fans_out_to_its_own_language() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Category);
    let ctx = h.context(&migration);

    let raw = json!({"id": "13", "name": "Schuhe", "_locale": "de-DE"});
    let result = CategoryConverter.convert(&raw, &ctx).await.unwrap();
    let converted = result.converted.unwrap();

    let german = h
        .mapping
        .resolve(EntityKind::Language, "de-DE")
        .await
        .unwrap()
        .unwrap();
    let key = german.to_string();
    assert_eq!(converted["translations"][key.as_str()]["name"], "Schuhe");

    // The default language key is not used for this record.
    if let Some(default) = h.mapping.resolve(EntityKind::Language, LOCALE).await.unwrap() {
        assert_ne!(default, german);
        assert!(converted["translations"]
            .get(default.to_string())
            .is_none());
    }
}

#[tokio::test]
async fn language_converter_keys_by_locale() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Language);
    let ctx = h.context(&migration);

    let raw = json!({"id": "1", "locale": "en_GB", "name": "English", "_locale": "en-GB"});
    let result = LanguageConverter.convert(&raw, &ctx).await.unwrap();
    let converted = result.converted.unwrap();

    assert_eq!(converted["localeCode"], "en-GB");
    // The language's own id is the same UUID every translation fan-out
    // resolves for this locale.
    assert_eq!(uuid_field(&converted, "id"), ctx.default_language_id().await.unwrap());
}

// ---------------------------------------------------------------------------
// Currency and orders share the ISO-code namespace
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_currency_reference_matches_currency_conversion() {
    let h = Harness::new();

    let migration = h.migration(Profile::Shop5, EntityKind::Currency);
    let currency = CurrencyConverter
        .convert(
            &json!({"id": "1", "currency": "EUR", "name": "Euro", "factor": 1.0, "standard": 1, "_locale": "en-GB"}),
            &h.context(&migration),
        )
        .await
        .unwrap();
    let currency_id = uuid_field(&currency.converted.unwrap(), "id");

    let migration = h.migration(Profile::Shop5, EntityKind::Order);
    let order = OrderConverter
        .convert(
            &json!({"id": "900", "customer_id": "55", "currency": "EUR", "ordernumber": "20001", "_locale": "en-GB"}),
            &h.context(&migration),
        )
        .await
        .unwrap();

    assert_eq!(uuid_field(&order.converted.unwrap(), "currencyId"), currency_id);
}

// ---------------------------------------------------------------------------
// Forward references
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_line_item_forward_references_product() {
    let h = Harness::new();

    // The order arrives before the product it references.
    let migration = h.migration(Profile::Shop5, EntityKind::Order);
    let order = OrderConverter
        .convert(
            &json!({
                "id": "900",
                "customer_id": "55",
                "details": [
                    {"id": "d1", "article_id": "A1", "name": "Thing", "quantity": 2, "price": 9.99}
                ],
                "_locale": "en-GB"
            }),
            &h.context(&migration),
        )
        .await
        .unwrap();
    let line_item = &order.converted.unwrap()["lineItems"][0];
    let referenced = uuid_field(line_item, "productId");

    // The product's own conversion reuses the placeholder.
    let migration = h.migration(Profile::Shop5, EntityKind::Product);
    let product = ProductConverter
        .convert(
            &json!({"id": "A1", "number": "SW-A1", "name": "Thing", "_locale": "en-GB"}),
            &h.context(&migration),
        )
        .await
        .unwrap();

    assert_eq!(uuid_field(&product.converted.unwrap(), "id"), referenced);
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

#[tokio::test]
async fn product_resolves_categories_in_bulk_with_placeholders() {
    let h = Harness::new();

    // Category 5 is already mapped; category 9 has not been migrated.
    let known = h
        .mapping
        .create_or_get(EntityKind::Category, "5")
        .await
        .unwrap();

    let migration = h.migration(Profile::Shop5, EntityKind::Product);
    let result = ProductConverter
        .convert(
            &json!({
                "id": "100",
                "number": "SW-100",
                "name": "Widget",
                "stock": 5,
                "active": true,
                "price": "19.99",
                "categories": ["5", "9"],
                "_locale": "en-GB"
            }),
            &h.context(&migration),
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();

    assert_eq!(uuid_field(&converted["categories"][0], "id"), known);
    let placeholder = uuid_field(&converted["categories"][1], "id");
    assert_eq!(
        h.mapping.resolve(EntityKind::Category, "9").await.unwrap(),
        Some(placeholder)
    );
    assert_eq!(converted["price"], json!(19.99));
    assert_eq!(converted["stock"], json!(5));
}

#[tokio::test]
async fn product_variants_and_media_convert_recursively() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Product);
    let ctx = h.context(&migration);

    let result = ProductConverter
        .convert(
            &json!({
                "id": "100",
                "number": "SW-100",
                "name": "Widget",
                "manufacturer": {"id": "m1", "name": "Acme"},
                "media": [
                    {"id": "med1", "path": "media/image/widget.jpg", "name": "widget.jpg", "file_size": 2048}
                ],
                "children": [
                    {"id": "100.1", "number": "SW-100.1", "stock": 2, "options": ["o1"]}
                ],
                "_locale": "en-GB"
            }),
            &ctx,
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();
    let product_id = uuid_field(&converted, "id");

    // Manufacturer got its own namespace.
    assert_eq!(
        h.mapping
            .resolve(EntityKind::Manufacturer, "m1")
            .await
            .unwrap(),
        Some(uuid_field(&converted["manufacturer"], "id"))
    );

    // The gallery item references the mapped media and staged a transfer.
    let media_id = uuid_field(&converted["media"][0]["media"], "id");
    assert_eq!(
        h.mapping.resolve(EntityKind::Media, "med1").await.unwrap(),
        Some(media_id)
    );
    assert_eq!(h.media.staged_count(), 1);

    // Variants are products of their own, linked back to the container.
    let child = &converted["children"][0];
    assert_eq!(uuid_field(child, "parentId"), product_id);
    assert_eq!(
        h.mapping
            .resolve(EntityKind::Product, "100.1")
            .await
            .unwrap(),
        Some(uuid_field(child, "id"))
    );
    assert_eq!(
        h.mapping
            .resolve(EntityKind::PropertyGroupOption, "o1")
            .await
            .unwrap(),
        Some(uuid_field(&child["options"][0], "id"))
    );
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn customer_without_email_is_structural() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Customer);
    let ctx = h.context(&migration);

    let error = CustomerConverter
        .convert(&json!({"id": "c1", "firstname": "Ann"}), &ctx)
        .await
        .unwrap_err();
    assert_matches!(
        error,
        ConvertError::MissingField {
            entity: EntityKind::Customer,
            field: "email",
        }
    );
}

#[tokio::test]
async fn customer_addresses_and_defaults_share_mappings() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Customer);
    let ctx = h.context(&migration);

    let result = CustomerConverter
        .convert(
            &json!({
                "id": "c1",
                "email": "ann@example.com",
                "firstname": "Ann",
                "lastname": "Lee",
                "customergroup": "EK",
                "defaultpayment": "3",
                "salutation": "ms",
                "addresses": [
                    {"id": "77", "firstname": "Ann", "lastname": "Lee", "street": "Main St 1",
                     "zipcode": "12345", "city": "Springfield", "country_id": "2"}
                ],
                "default_billing_address_id": "77",
                "default_shipping_address_id": "77",
                "_locale": "en-GB"
            }),
            &ctx,
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();

    let address_id = uuid_field(&converted["addresses"][0], "id");
    assert_eq!(uuid_field(&converted, "defaultBillingAddressId"), address_id);
    assert_eq!(uuid_field(&converted, "defaultShippingAddressId"), address_id);
    assert_eq!(
        h.mapping.resolve(EntityKind::Country, "2").await.unwrap(),
        Some(uuid_field(&converted["addresses"][0], "countryId"))
    );
    assert_eq!(
        h.mapping
            .resolve(EntityKind::CustomerGroup, "EK")
            .await
            .unwrap(),
        Some(uuid_field(&converted, "groupId"))
    );
}

// ---------------------------------------------------------------------------
// Property group options
// ---------------------------------------------------------------------------

#[tokio::test]
async fn property_group_option_nests_its_group() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::PropertyGroupOption);
    let ctx = h.context(&migration);

    let result = PropertyGroupOptionConverter
        .convert(
            &json!({
                "id": "o1",
                "name": "red",
                "position": 2,
                "group": {"id": "g1", "name": "colour"},
                "_locale": "en-GB"
            }),
            &ctx,
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();

    assert_eq!(
        h.mapping
            .resolve(EntityKind::PropertyGroup, "g1")
            .await
            .unwrap(),
        Some(uuid_field(&converted["group"], "id"))
    );

    let language_id = h
        .mapping
        .resolve(EntityKind::Language, LOCALE)
        .await
        .unwrap()
        .unwrap()
        .to_string();
    assert_eq!(converted["translations"][language_id.as_str()]["name"], "red");
    assert_eq!(converted["translations"][language_id.as_str()]["position"], 2);
    assert_eq!(converted["group"]["translations"][language_id.as_str()]["name"], "colour");
}

#[tokio::test]
async fn property_group_option_without_group_is_structural() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::PropertyGroupOption);
    let ctx = h.context(&migration);

    let error = PropertyGroupOptionConverter
        .convert(&json!({"id": "o1", "name": "red"}), &ctx)
        .await
        .unwrap_err();
    assert_matches!(error, ConvertError::MissingField { field: "group", .. });
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[tokio::test]
async fn media_stages_binary_transfer() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Media);
    let ctx = h.context(&migration);

    let result = MediaConverter
        .convert(
            &json!({
                "id": "med9",
                "name": "banner.jpg",
                "path": "media/image/banner.jpg",
                "file_size": 4096,
                "description": "Spring banner",
                "_locale": "en-GB"
            }),
            &ctx,
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();

    assert_eq!(h.media.staged_count(), 1);
    h.media.write_media_file().await.unwrap();
    let request = &h.media.flushed()[0];
    assert_eq!(request.uri, "media/image/banner.jpg");
    assert_eq!(request.file_name, "banner.jpg");
    assert_eq!(request.file_size, 4096);
    assert_eq!(request.media_id, uuid_field(&converted, "id"));
}

#[tokio::test]
async fn media_without_location_degrades_to_unmapped() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop5, EntityKind::Media);
    let ctx = h.context(&migration);

    let raw = json!({"id": "med9", "name": "banner.jpg"});
    let result = MediaConverter.convert(&raw, &ctx).await.unwrap();

    assert!(result.is_failure());
    assert_eq!(result.unmapped, Some(raw));

    h.logger.save_logging().await.unwrap();
    assert_eq!(h.logger.saved_of_type(LOG_TYPE_MEDIA_NOT_CONVERTED).len(), 1);
}

// ---------------------------------------------------------------------------
// CMS pages (structured 6.x profile)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn locked_cms_page_is_skipped() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop6, EntityKind::CmsPage);
    let ctx = h.context(&migration);

    let raw = json!({"id": "p1", "type": "landingpage", "locked": true});
    let result = CmsPageConverter.convert(&raw, &ctx).await.unwrap();

    assert!(result.is_failure());
    assert_eq!(result.unmapped, Some(raw));

    h.logger.save_logging().await.unwrap();
    assert_eq!(h.logger.saved_of_type(LOG_TYPE_SKIPPED).len(), 1);
}

#[tokio::test]
async fn cms_page_tree_walk_remaps_nested_references() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop6, EntityKind::CmsPage);
    let ctx = h.context(&migration);

    let result = CmsPageConverter
        .convert(
            &json!({
                "id": "p2",
                "type": "page",
                "locked": false,
                "previewMediaId": "M3",
                "translations": [{"languageId": "L1", "name": "Home"}],
                "sections": [{
                    "position": 0,
                    "backgroundMediaId": "M1",
                    "blocks": [{
                        "position": 0,
                        "slots": [{
                            "slot": "content",
                            "backgroundMediaId": "M2",
                            "translations": [{"languageId": "L1", "config": {}}]
                        }]
                    }]
                }],
                "categories": [{"id": "c9"}]
            }),
            &ctx,
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();

    let language = h
        .mapping
        .resolve(EntityKind::Language, "L1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(uuid_field(&converted["translations"][0], "languageId"), language);

    let section = &converted["sections"][0];
    let block = &section["blocks"][0];
    let slot = &block["slots"][0];
    assert_eq!(
        h.mapping.resolve(EntityKind::Media, "M1").await.unwrap(),
        Some(uuid_field(section, "backgroundMediaId"))
    );
    assert_eq!(
        h.mapping.resolve(EntityKind::Media, "M2").await.unwrap(),
        Some(uuid_field(slot, "backgroundMediaId"))
    );
    // Both translation lists resolved the same source language id.
    assert_eq!(uuid_field(&slot["translations"][0], "languageId"), language);

    assert_eq!(
        h.mapping.resolve(EntityKind::Media, "M3").await.unwrap(),
        Some(uuid_field(&converted, "previewMediaId"))
    );
    assert_eq!(
        h.mapping.resolve(EntityKind::Category, "c9").await.unwrap(),
        Some(uuid_field(&converted["categories"][0], "id"))
    );
}

// ---------------------------------------------------------------------------
// Sales channels (structured 6.x profile)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sales_channel_remaps_references_and_arrives_inactive() {
    let h = Harness::new();
    let migration = h.migration(Profile::Shop6, EntityKind::SalesChannel);
    let ctx = h.context(&migration);

    let result = SalesChannelConverter
        .convert(
            &json!({
                "id": "sc1",
                "name": "Storefront",
                "active": true,
                "languages": [{"id": "L1"}],
                "currencies": [{"id": "C1"}],
                "languageId": "L1",
                "currencyId": "C1",
                "customerGroupId": "G1",
                "navigationCategoryId": "N1",
                "domains": [{
                    "url": "https://shop.example.com",
                    "languageId": "L1",
                    "currencyId": "C1",
                    "snippetSetId": "S1"
                }]
            }),
            &ctx,
        )
        .await
        .unwrap();
    let converted = result.converted.unwrap();

    assert_eq!(converted["active"], json!(false));

    // The association list and the singular field agree on the mapping.
    let language_id = uuid_field(&converted, "languageId");
    assert_eq!(uuid_field(&converted["languages"][0], "id"), language_id);
    assert_eq!(uuid_field(&converted["domains"][0], "languageId"), language_id);
    assert_eq!(
        uuid_field(&converted["domains"][0], "currencyId"),
        uuid_field(&converted, "currencyId")
    );
    assert_eq!(
        h.mapping
            .resolve(EntityKind::Category, "N1")
            .await
            .unwrap(),
        Some(uuid_field(&converted, "navigationCategoryId"))
    );
}
