//! # Content Normalizer
//!
//! Reconciles an arbitrary content record against a component schema so the
//! result carries every declared key.
//!
//! For each declared field, in schema order:
//!
//! - absent or `null` → the field's default (object fields get a fresh,
//!   recursively defaulted object; list fields get their declared default,
//!   usually `[]`);
//! - present object field whose value is an object → nested merge: fill
//!   absent/null nested fields, recurse into present nested objects, keep
//!   every other nested key;
//! - present list field → passed through, or each object element normalized
//!   against the item schema under [`ListItemPolicy::NormalizeItems`];
//! - present primitive field → passed through unchanged, whatever its type.
//!
//! Keys the schema does not declare are preserved verbatim. An unknown
//! component type is an identity passthrough. A known component given a
//! non-object record (null, array, scalar) is normalized as if it were `{}`.
//!
//! The transform is pure, deterministic, idempotent, and infallible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field::{ComponentSchema, FieldSchema};
use crate::registry::SchemaRegistry;

/// How list elements are treated when the list declares an item schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListItemPolicy {
    /// Leave list contents exactly as supplied.
    #[default]
    PassThrough,
    /// Normalize every object element against the item schema. Non-object
    /// elements pass through.
    NormalizeItems,
}

impl ListItemPolicy {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass-through",
            Self::NormalizeItems => "normalize-items",
        }
    }
}

impl std::fmt::Display for ListItemPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListItemPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass-through" => Ok(Self::PassThrough),
            "normalize-items" => Ok(Self::NormalizeItems),
            other => Err(format!(
                "unknown list item policy \"{other}\" (expected pass-through or normalize-items)"
            )),
        }
    }
}

/// Options controlling normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Treatment of list elements.
    pub list_items: ListItemPolicy,
}

/// Normalize `existing` against the schema of `component` with default
/// options.
pub fn normalize(registry: &SchemaRegistry, component: &str, existing: Value) -> Value {
    normalize_with(registry, component, existing, &NormalizeOptions::default())
}

/// Normalize `existing` against the schema of `component`.
pub fn normalize_with(
    registry: &SchemaRegistry,
    component: &str,
    existing: Value,
    options: &NormalizeOptions,
) -> Value {
    let Some(schema) = registry.get_schema(component) else {
        return existing;
    };
    let record = match existing {
        Value::Object(map) => map,
        other => {
            tracing::debug!(
                component,
                found = json_type(&other),
                "non-object content replaced with empty record"
            );
            Map::new()
        }
    };
    Value::Object(normalize_record(schema, record, options))
}

fn normalize_record(
    schema: &ComponentSchema,
    mut record: Map<String, Value>,
    options: &NormalizeOptions,
) -> Map<String, Value> {
    for (name, field) in schema.fields() {
        let slot = record.entry(name.to_string()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = field.default_value();
        }
        normalize_present(field, slot, options);
    }
    record
}

fn normalize_present(field: &FieldSchema, value: &mut Value, options: &NormalizeOptions) {
    match field {
        FieldSchema::Object { fields } => {
            if let Value::Object(map) = value {
                let nested = std::mem::take(map);
                *map = normalize_record(fields, nested, options);
            }
        }
        FieldSchema::List {
            items: Some(items), ..
        } if options.list_items == ListItemPolicy::NormalizeItems => {
            if let Value::Array(elements) = value {
                for element in elements.iter_mut() {
                    if let Value::Object(map) = element {
                        let item = std::mem::take(map);
                        *map = normalize_record(items, item, options);
                    }
                }
            }
        }
        _ => {}
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
