//! # YAML Component Definitions
//!
//! Components beyond the built-in set are declared as YAML documents:
//!
//! ```yaml
//! component: Testimonial
//! fields:
//!   - name: quote
//!     kind: long-text
//!   - name: author
//!     kind: object
//!     fields:
//!       - name: name
//!         kind: text
//!         default: Anonymous
//!   - name: links
//!     kind: list
//!     items:
//!       - name: href
//!         kind: text
//! ```
//!
//! A primitive field without a `default` gets the zero value of its kind.
//! Object defaults are always derived from their nested fields, so an object
//! field may not declare one. The same structure is used to describe
//! registered components back to clients.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::field::{ComponentSchema, FieldKind, FieldSchema};

/// Errors raised while loading or validating component definitions.
#[derive(Error, Debug)]
pub enum SchemaDefinitionError {
    /// A definition file or directory could not be read.
    #[error("failed to read component definitions from {path}: {source}")]
    Io {
        /// Path being read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A definition file is not valid YAML or does not match the format.
    #[error("failed to parse component definition {path}: {reason}")]
    Parse {
        /// Path being parsed.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The `component` name is empty.
    #[error("component definition has an empty name")]
    EmptyComponentName,

    /// Two files in one directory define the same component.
    #[error("component \"{component}\" is defined more than once")]
    DuplicateComponent {
        /// Component name.
        component: String,
    },

    /// A field name appears twice at the same nesting level.
    #[error("component \"{component}\": duplicate field \"{field}\"")]
    DuplicateField {
        /// Component name.
        component: String,
        /// Dotted field path.
        field: String,
    },

    /// A field name is empty.
    #[error("component \"{component}\": field under \"{parent}\" has an empty name")]
    EmptyFieldName {
        /// Component name.
        component: String,
        /// Dotted path of the enclosing field, or `<root>`.
        parent: String,
    },

    /// A declared default does not match the field's kind.
    #[error("component \"{component}\": default of field \"{field}\" does not match kind {kind}")]
    DefaultTypeMismatch {
        /// Component name.
        component: String,
        /// Dotted field path.
        field: String,
        /// Declared kind.
        kind: FieldKind,
    },

    /// Nested fields declared where the kind does not allow them.
    #[error("component \"{component}\": field \"{field}\" of kind {kind} cannot declare `{key}`")]
    UnexpectedNestedFields {
        /// Component name.
        component: String,
        /// Dotted field path.
        field: String,
        /// Declared kind.
        kind: FieldKind,
        /// The offending key (`fields` or `items`).
        key: &'static str,
    },

    /// An object field without any nested fields.
    #[error("component \"{component}\": object field \"{field}\" declares no nested fields")]
    EmptyObject {
        /// Component name.
        component: String,
        /// Dotted field path.
        field: String,
    },

    /// The JSON Schema rendered for a component failed to compile.
    #[error("invalid JSON Schema generated for component \"{component}\": {reason}")]
    InvalidJsonSchema {
        /// Component name.
        component: String,
        /// Compiler message.
        reason: String,
    },
}

/// A component declared in YAML (or described back to a client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDefinition {
    /// Component type name.
    pub component: String,
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields in schema order.
    pub fields: Vec<FieldDefinition>,
}

/// One field of a [`ComponentDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Default value; must match `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Nested fields of an `object` field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDefinition>,
    /// Item fields of a `list` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<FieldDefinition>>,
}

impl ComponentDefinition {
    /// Parse a definition from a YAML string.
    pub fn from_yaml(source: &str, path: &str) -> Result<Self, SchemaDefinitionError> {
        serde_yaml::from_str(source).map_err(|e| SchemaDefinitionError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate the definition and build its schema.
    pub fn to_schema(&self) -> Result<ComponentSchema, SchemaDefinitionError> {
        if self.component.trim().is_empty() {
            return Err(SchemaDefinitionError::EmptyComponentName);
        }
        build_schema(&self.component, "", &self.fields)
    }

    /// Describe a registered schema in definition form.
    pub fn from_schema(component: &str, schema: &ComponentSchema) -> Self {
        Self {
            component: component.to_string(),
            description: None,
            fields: describe_fields(schema),
        }
    }
}

fn build_schema(
    component: &str,
    parent: &str,
    defs: &[FieldDefinition],
) -> Result<ComponentSchema, SchemaDefinitionError> {
    let mut seen = HashSet::new();
    let mut schema = ComponentSchema::new();

    for def in defs {
        if def.name.trim().is_empty() {
            return Err(SchemaDefinitionError::EmptyFieldName {
                component: component.to_string(),
                parent: if parent.is_empty() {
                    "<root>".to_string()
                } else {
                    parent.to_string()
                },
            });
        }
        let path = if parent.is_empty() {
            def.name.clone()
        } else {
            format!("{parent}.{}", def.name)
        };
        if !seen.insert(def.name.as_str()) {
            return Err(SchemaDefinitionError::DuplicateField {
                component: component.to_string(),
                field: path,
            });
        }
        schema.insert(def.name.clone(), build_field(component, &path, def)?);
    }

    Ok(schema)
}

fn build_field(
    component: &str,
    path: &str,
    def: &FieldDefinition,
) -> Result<FieldSchema, SchemaDefinitionError> {
    let mismatch = || SchemaDefinitionError::DefaultTypeMismatch {
        component: component.to_string(),
        field: path.to_string(),
        kind: def.kind,
    };
    let unexpected = |key: &'static str| SchemaDefinitionError::UnexpectedNestedFields {
        component: component.to_string(),
        field: path.to_string(),
        kind: def.kind,
        key,
    };

    if def.kind != FieldKind::Object && !def.fields.is_empty() {
        return Err(unexpected("fields"));
    }
    if def.kind != FieldKind::List && def.items.is_some() {
        return Err(unexpected("items"));
    }

    let string_default = || -> Result<String, SchemaDefinitionError> {
        match &def.default {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(mismatch()),
        }
    };

    let field = match def.kind {
        FieldKind::Text => FieldSchema::Text {
            default: string_default()?,
        },
        FieldKind::LongText => FieldSchema::LongText {
            default: string_default()?,
        },
        FieldKind::ImageReference => FieldSchema::ImageReference {
            default: string_default()?,
        },
        FieldKind::Number => FieldSchema::Number {
            default: match &def.default {
                None => 0.into(),
                Some(Value::Number(n)) => n.clone(),
                Some(_) => return Err(mismatch()),
            },
        },
        FieldKind::Boolean => FieldSchema::Boolean {
            default: match &def.default {
                None => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => return Err(mismatch()),
            },
        },
        FieldKind::Object => {
            if def.default.is_some() {
                return Err(mismatch());
            }
            if def.fields.is_empty() {
                return Err(SchemaDefinitionError::EmptyObject {
                    component: component.to_string(),
                    field: path.to_string(),
                });
            }
            FieldSchema::Object {
                fields: Box::new(build_schema(component, path, &def.fields)?),
            }
        }
        FieldKind::List => {
            let default = match &def.default {
                None => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(_) => return Err(mismatch()),
            };
            let items = match &def.items {
                Some(item_defs) => Some(Box::new(build_schema(
                    component,
                    &format!("{path}[]"),
                    item_defs,
                )?)),
                None => None,
            };
            FieldSchema::List { items, default }
        }
    };

    Ok(field)
}

fn describe_fields(schema: &ComponentSchema) -> Vec<FieldDefinition> {
    schema
        .fields()
        .map(|(name, field)| {
            let (fields, items) = match field {
                FieldSchema::Object { fields } => (describe_fields(fields), None),
                FieldSchema::List { items, .. } => {
                    (Vec::new(), items.as_deref().map(describe_fields))
                }
                _ => (Vec::new(), None),
            };
            FieldDefinition {
                name: name.to_string(),
                kind: field.kind(),
                default: match field {
                    FieldSchema::Object { .. } => None,
                    other => Some(other.default_value()),
                },
                fields,
                items,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TESTIMONIAL: &str = r#"
component: Testimonial
description: Customer quote with attribution
fields:
  - name: quote
    kind: long-text
  - name: rating
    kind: number
    default: 4.5
  - name: author
    kind: object
    fields:
      - name: name
        kind: text
        default: Anonymous
      - name: avatar
        kind: image-reference
  - name: links
    kind: list
    items:
      - name: href
        kind: text
"#;

    #[test]
    fn parses_and_builds_schema() {
        let def = ComponentDefinition::from_yaml(TESTIMONIAL, "testimonial.yaml").unwrap();
        let schema = def.to_schema().unwrap();
        assert_eq!(schema.keys(), vec!["quote", "rating", "author", "links"]);
        assert_eq!(
            schema.default_record(),
            json!({
                "quote": "",
                "rating": 4.5,
                "author": {"name": "Anonymous", "avatar": ""},
                "links": []
            })
        );
        match schema.get("links") {
            Some(FieldSchema::List { items: Some(items), .. }) => {
                assert_eq!(items.keys(), vec!["href"]);
            }
            other => panic!("expected list with items, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_field() {
        let yaml = "component: X\nfields:\n  - {name: a, kind: text}\n  - {name: a, kind: number}\n";
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::DuplicateField { ref field, .. } if field == "a"));
    }

    #[test]
    fn rejects_nested_duplicate_with_dotted_path() {
        let yaml = r#"
component: X
fields:
  - name: address
    kind: object
    fields:
      - {name: city, kind: text}
      - {name: city, kind: text}
"#;
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(err.to_string().contains("address.city"));
    }

    #[test]
    fn rejects_mismatched_default() {
        let yaml = "component: X\nfields:\n  - {name: n, kind: number, default: \"three\"}\n";
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaDefinitionError::DefaultTypeMismatch { kind: FieldKind::Number, .. }
        ));
    }

    #[test]
    fn rejects_object_default() {
        let yaml = r#"
component: X
fields:
  - name: o
    kind: object
    default: {}
    fields:
      - {name: a, kind: text}
"#;
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::DefaultTypeMismatch { .. }));
    }

    #[test]
    fn rejects_nested_fields_on_primitive() {
        let yaml = r#"
component: X
fields:
  - name: title
    kind: text
    fields:
      - {name: inner, kind: text}
"#;
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaDefinitionError::UnexpectedNestedFields { key: "fields", kind: FieldKind::Text, .. }
        ));
    }

    #[test]
    fn rejects_items_on_object() {
        let yaml = r#"
component: X
fields:
  - name: o
    kind: object
    fields:
      - {name: a, kind: text}
    items:
      - {name: b, kind: text}
"#;
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaDefinitionError::UnexpectedNestedFields { key: "items", .. }
        ));
    }

    #[test]
    fn rejects_empty_object_and_empty_names() {
        let yaml = "component: X\nfields:\n  - {name: o, kind: object}\n";
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::EmptyObject { .. }));

        let yaml = "component: \"\"\nfields: []\n";
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml")
            .unwrap()
            .to_schema()
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::EmptyComponentName));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let yaml = "component: X\nfields:\n  - {name: a, kind: text, colour: red}\n";
        let err = ComponentDefinition::from_yaml(yaml, "x.yaml").unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::Parse { ref path, .. } if path == "x.yaml"));
    }

    #[test]
    fn describe_then_build_reproduces_schema() {
        let def = ComponentDefinition::from_yaml(TESTIMONIAL, "t.yaml").unwrap();
        let schema = def.to_schema().unwrap();
        let described = ComponentDefinition::from_schema("Testimonial", &schema);
        assert_eq!(described.to_schema().unwrap(), schema);
        assert_eq!(described.fields[0].default, Some(json!("")));
        assert_eq!(described.fields[2].default, None);
    }
}
