//! Conversion result structs and raw-record field helpers.
//!
//! Raw records are opaque `serde_json::Value` objects coming from the
//! source system. Converters consume fields out of a mutable copy of the
//! raw object; whatever is left over becomes the `unmapped` remainder that
//! operators can inspect later.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::entity::EntityKind;

// ---------------------------------------------------------------------------
// ConvertStruct
// ---------------------------------------------------------------------------

/// The result of converting one raw record.
///
/// A successful conversion has a non-empty `converted` payload; a fully
/// failed conversion has `converted = None` and the entire raw record as
/// `unmapped`. Empty objects and arrays are normalized to `None` so the
/// two cases stay distinguishable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertStruct {
    pub converted: Option<Value>,
    pub unmapped: Option<Value>,
    /// The record's own minted target identifier, when one was created.
    pub primary_mapping_ref: Option<Uuid>,
}

impl ConvertStruct {
    pub fn new(converted: Option<Value>, unmapped: Option<Value>) -> Self {
        Self {
            converted: normalize(converted),
            unmapped: normalize(unmapped),
            primary_mapping_ref: None,
        }
    }

    /// A successful conversion carrying its primary mapping reference.
    pub fn with_mapping(converted: Value, unmapped: Option<Value>, mapping: Uuid) -> Self {
        Self {
            converted: normalize(Some(converted)),
            unmapped: normalize(unmapped),
            primary_mapping_ref: Some(mapping),
        }
    }

    /// A fully failed conversion: the whole raw record becomes unmapped.
    pub fn failed(raw: Value) -> Self {
        Self {
            converted: None,
            unmapped: normalize(Some(raw)),
            primary_mapping_ref: None,
        }
    }

    /// Neither converted nor unmapped payload present.
    pub fn is_empty(&self) -> bool {
        self.converted.is_none() && self.unmapped.is_none()
    }

    /// The conversion produced no usable target record.
    pub fn is_failure(&self) -> bool {
        self.converted.is_none()
    }
}

fn normalize(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// DataRecord
// ---------------------------------------------------------------------------

/// One aggregated batch row handed to the external writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRecord {
    pub entity: EntityKind,
    pub run_id: Uuid,
    pub source_id: String,
    pub raw: Value,
    pub converted: Option<Value>,
    pub unmapped: Option<Value>,
    pub convert_failure: bool,
}

impl DataRecord {
    pub fn from_convert(
        entity: EntityKind,
        run_id: Uuid,
        source_id: String,
        raw: Value,
        result: ConvertStruct,
    ) -> Self {
        let convert_failure = result.is_failure();
        Self {
            entity,
            run_id,
            source_id,
            raw,
            converted: result.converted,
            unmapped: result.unmapped,
            convert_failure,
        }
    }

    /// The row emitted when a converter raised: nothing converted, the
    /// whole raw record retained for diagnostics.
    pub fn forced_unmapped(
        entity: EntityKind,
        run_id: Uuid,
        source_id: String,
        raw: Value,
    ) -> Self {
        let result = ConvertStruct::failed(raw.clone());
        Self::from_convert(entity, run_id, source_id, raw, result)
    }

    pub fn is_empty(&self) -> bool {
        self.converted.is_none() && self.unmapped.is_none()
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Target type for [`convert_value`] coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    /// Copy the value untouched.
    Raw,
}

/// Move a field from a raw source object into a converted target object,
/// coercing it to the requested type.
///
/// The source field is always consumed (removed) when present, so that the
/// remainder of the source object is exactly the unmapped part. Returns
/// `true` when a value was written to the target; absent, null, empty or
/// uncoercible values yield `false` and write nothing.
pub fn convert_value(
    target: &mut Map<String, Value>,
    target_key: &str,
    source: &mut Map<String, Value>,
    source_key: &str,
    ty: FieldType,
) -> bool {
    let Some(value) = source.remove(source_key) else {
        return false;
    };
    if matches!(&value, Value::Null) {
        return false;
    }
    if matches!(&value, Value::String(s) if s.is_empty()) {
        return false;
    }
    let coerced = match ty {
        FieldType::Raw => Some(value),
        FieldType::String => coerce_string(&value).map(Value::String),
        FieldType::Integer => coerce_integer(&value).map(Value::from),
        FieldType::Float => coerce_float(&value).map(Value::from),
        FieldType::Boolean => coerce_boolean(&value).map(Value::Bool),
    };
    match coerced {
        Some(v) => {
            target.insert(target_key.to_string(), v);
            true
        }
        None => false,
    }
}

/// Remove a field from a source object and coerce it to a string.
///
/// Source identifiers arrive as strings or integers depending on the
/// gateway, so both are accepted.
pub fn take_string(source: &mut Map<String, Value>, key: &str) -> Option<String> {
    let value = source.remove(key)?;
    coerce_string(&value)
}

/// Remove a field from a source object and coerce it to an integer.
pub fn take_integer(source: &mut Map<String, Value>, key: &str) -> Option<i64> {
    let value = source.remove(key)?;
    coerce_integer(&value)
}

/// Read a string field from a raw value without consuming it.
pub fn get_string(value: &Value, key: &str) -> Option<String> {
    coerce_string(value.as_object()?.get(key)?)
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    }
}
