//! # JSON Schema Export & Advisory Lint
//!
//! Renders a [`ComponentSchema`] as a JSON Schema (Draft 2020-12) document
//! that form builders can consume, and checks content against it.
//!
//! The rendered schema is descriptive, not a gate: it declares no `required`
//! keys (normalization supplies them) and permits additional properties
//! (unknown keys are preserved). [`lint`] therefore only reports type
//! mismatches, which the normalizer deliberately passes through.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::definition::SchemaDefinitionError;
use crate::field::{ComponentSchema, FieldSchema};
use crate::registry::SchemaRegistry;

/// Keyword carrying the field kind for form builders.
pub const FIELD_KIND_KEYWORD: &str = "x-field-kind";

/// A single advisory lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    /// JSON pointer to the offending value.
    pub instance_path: String,
    /// Human-readable message.
    pub message: String,
}

/// Render a component schema as a JSON Schema document.
pub fn to_json_schema(component: &str, schema: &ComponentSchema) -> Value {
    let mut document = object_schema(schema);
    if let Value::Object(map) = &mut document {
        map.insert(
            "$schema".to_string(),
            json!("https://json-schema.org/draft/2020-12/schema"),
        );
        map.insert("title".to_string(), json!(component));
    }
    document
}

fn object_schema(schema: &ComponentSchema) -> Value {
    let properties: Map<String, Value> = schema
        .fields()
        .map(|(name, field)| (name.to_string(), field_schema(field)))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": true,
    })
}

fn field_schema(field: &FieldSchema) -> Value {
    let mut out = match field {
        FieldSchema::Text { .. } | FieldSchema::LongText { .. } | FieldSchema::ImageReference { .. } => {
            json!({"type": "string"})
        }
        FieldSchema::Number { .. } => json!({"type": "number"}),
        FieldSchema::Boolean { .. } => json!({"type": "boolean"}),
        FieldSchema::Object { fields } => object_schema(fields),
        FieldSchema::List { items, .. } => match items {
            Some(items) => json!({"type": "array", "items": object_schema(items)}),
            None => json!({"type": "array"}),
        },
    };
    if let Value::Object(map) = &mut out {
        map.insert(FIELD_KIND_KEYWORD.to_string(), json!(field.kind().as_str()));
        map.insert("default".to_string(), field.default_value());
    }
    out
}

/// Check `content` against the rendered schema of `component`.
///
/// Unknown components yield no findings.
///
/// # Errors
///
/// Returns [`SchemaDefinitionError::InvalidJsonSchema`] if the rendered
/// schema fails to compile.
pub fn lint(
    registry: &SchemaRegistry,
    component: &str,
    content: &Value,
) -> Result<Vec<LintFinding>, SchemaDefinitionError> {
    let Some(schema) = registry.get_schema(component) else {
        return Ok(Vec::new());
    };
    let document = to_json_schema(component, schema);

    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    let validator =
        opts.build(&document)
            .map_err(|e| SchemaDefinitionError::InvalidJsonSchema {
                component: component.to_string(),
                reason: e.to_string(),
            })?;

    let findings = validator
        .iter_errors(content)
        .map(|e| LintFinding {
            instance_path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();
    Ok(findings)
}
