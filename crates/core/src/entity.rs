//! Entity kinds.
//!
//! Every mapping namespace the pipeline writes into is one of these tags.
//! The string forms are what land in the `entity_type` columns of the
//! mapping and log tables, so they are stable identifiers, not display
//! names.

use serde::{Deserialize, Serialize};

/// A migratable entity kind (and mapping namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Category,
    Customer,
    CustomerAddress,
    CustomerGroup,
    Order,
    OrderAddress,
    OrderLineItem,
    Media,
    MediaTranslation,
    Language,
    Currency,
    Country,
    SalesChannel,
    CmsPage,
    PropertyGroup,
    PropertyGroupOption,
    Manufacturer,
    PaymentMethod,
    ShippingMethod,
    SnippetSet,
    Salutation,
}

impl EntityKind {
    /// Return the entity tag as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Category => "category",
            Self::Customer => "customer",
            Self::CustomerAddress => "customer_address",
            Self::CustomerGroup => "customer_group",
            Self::Order => "order",
            Self::OrderAddress => "order_address",
            Self::OrderLineItem => "order_line_item",
            Self::Media => "media",
            Self::MediaTranslation => "media_translation",
            Self::Language => "language",
            Self::Currency => "currency",
            Self::Country => "country",
            Self::SalesChannel => "sales_channel",
            Self::CmsPage => "cms_page",
            Self::PropertyGroup => "property_group",
            Self::PropertyGroupOption => "property_group_option",
            Self::Manufacturer => "manufacturer",
            Self::PaymentMethod => "payment_method",
            Self::ShippingMethod => "shipping_method",
            Self::SnippetSet => "snippet_set",
            Self::Salutation => "salutation",
        }
    }

    /// Parse an entity tag. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "product" => Some(Self::Product),
            "category" => Some(Self::Category),
            "customer" => Some(Self::Customer),
            "customer_address" => Some(Self::CustomerAddress),
            "customer_group" => Some(Self::CustomerGroup),
            "order" => Some(Self::Order),
            "order_address" => Some(Self::OrderAddress),
            "order_line_item" => Some(Self::OrderLineItem),
            "media" => Some(Self::Media),
            "media_translation" => Some(Self::MediaTranslation),
            "language" => Some(Self::Language),
            "currency" => Some(Self::Currency),
            "country" => Some(Self::Country),
            "sales_channel" => Some(Self::SalesChannel),
            "cms_page" => Some(Self::CmsPage),
            "property_group" => Some(Self::PropertyGroup),
            "property_group_option" => Some(Self::PropertyGroupOption),
            "manufacturer" => Some(Self::Manufacturer),
            "payment_method" => Some(Self::PaymentMethod),
            "shipping_method" => Some(Self::ShippingMethod),
            "snippet_set" => Some(Self::SnippetSet),
            "salutation" => Some(Self::Salutation),
            _ => None,
        }
    }

    /// All valid entity tags.
    pub const ALL: &'static [&'static str] = &[
        "product",
        "category",
        "customer",
        "customer_address",
        "customer_group",
        "order",
        "order_address",
        "order_line_item",
        "media",
        "media_translation",
        "language",
        "currency",
        "country",
        "sales_channel",
        "cms_page",
        "property_group",
        "property_group_option",
        "manufacturer",
        "payment_method",
        "shipping_method",
        "snippet_set",
        "salutation",
    ];
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
