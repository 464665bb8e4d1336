//! Static data-set descriptors.
//!
//! A data set describes, per (profile, entity) pair, where the reader
//! fetches raw records from and how to pull embedded media references out
//! of a converted batch. Data sets carry no mutable state.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::entity::EntityKind;
use crate::profile::Profile;

/// Descriptor of one entity type's fetch route for a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataSet {
    pub entity: EntityKind,
    /// Route the gateway reader uses to fetch this entity's rows.
    pub api_route: &'static str,
    /// Source table used for total counting.
    pub counting_table: &'static str,
}

impl DataSet {
    /// Extract the media identifiers referenced by a converted batch, so
    /// the orchestrator can register pending file transfers.
    ///
    /// Which paths are inspected depends on the entity: products embed a
    /// media gallery and a manufacturer image, categories and property
    /// group options a single cover image, media records are themselves
    /// the reference.
    pub fn media_ids(&self, converted: &[Value]) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for record in converted {
            match self.entity {
                EntityKind::Product => {
                    if let Some(items) = record.get("media").and_then(Value::as_array) {
                        for item in items {
                            push_uuid(&mut ids, item.get("media").and_then(|m| m.get("id")));
                        }
                    }
                    push_uuid(
                        &mut ids,
                        record
                            .get("manufacturer")
                            .and_then(|m| m.get("media"))
                            .and_then(|m| m.get("id")),
                    );
                }
                EntityKind::Media => {
                    push_uuid(&mut ids, record.get("id"));
                }
                EntityKind::Category | EntityKind::PropertyGroupOption => {
                    push_uuid(&mut ids, record.get("media").and_then(|m| m.get("id")));
                }
                _ => {}
            }
        }
        ids
    }
}

fn push_uuid(ids: &mut Vec<Uuid>, value: Option<&Value>) {
    if let Some(id) = value.and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()) {
        ids.push(id);
    }
}

/// Data sets for the 5.x profile, in migration dependency order: entities
/// referenced by others come first so most lookups hit existing mappings
/// (forward references still resolve via placeholder mappings).
const SHOP5_DATA_SETS: &[DataSet] = &[
    DataSet {
        entity: EntityKind::Language,
        api_route: "languages",
        counting_table: "shop_locales",
    },
    DataSet {
        entity: EntityKind::Currency,
        api_route: "currencies",
        counting_table: "shop_currencies",
    },
    DataSet {
        entity: EntityKind::Category,
        api_route: "categories",
        counting_table: "shop_categories",
    },
    DataSet {
        entity: EntityKind::Media,
        api_route: "media",
        counting_table: "shop_media",
    },
    DataSet {
        entity: EntityKind::PropertyGroupOption,
        api_route: "property-group-options",
        counting_table: "shop_filter_values",
    },
    DataSet {
        entity: EntityKind::Product,
        api_route: "products",
        counting_table: "shop_articles",
    },
    DataSet {
        entity: EntityKind::Customer,
        api_route: "customers",
        counting_table: "shop_customers",
    },
    DataSet {
        entity: EntityKind::Order,
        api_route: "orders",
        counting_table: "shop_orders",
    },
];

/// Data sets for the structured 6.x profile.
const SHOP6_DATA_SETS: &[DataSet] = &[
    DataSet {
        entity: EntityKind::CmsPage,
        api_route: "cms-pages",
        counting_table: "cms_page",
    },
    DataSet {
        entity: EntityKind::SalesChannel,
        api_route: "sales-channels",
        counting_table: "sales_channel",
    },
];

/// All data sets of a profile, in migration dependency order.
pub fn data_sets_for(profile: Profile) -> &'static [DataSet] {
    match profile {
        Profile::Shop5 => SHOP5_DATA_SETS,
        Profile::Shop6 => SHOP6_DATA_SETS,
    }
}

/// Look up the data set for a (profile, entity) pair.
pub fn data_set_for(profile: Profile, entity: EntityKind) -> Option<DataSet> {
    data_sets_for(profile).iter().copied().find(|d| d.entity == entity)
}
