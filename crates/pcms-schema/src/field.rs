//! Field and component schema types.
//!
//! [`FieldSchema`] is a sum type: primitive kinds carry a default typed to
//! match the kind, `Object` carries a boxed nested schema, and `List` carries
//! an optional boxed item schema. Boxing keeps the recursive definition
//! finite in size.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The primitive or structural kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    LongText,
    /// Integer or fractional number.
    Number,
    /// True/false toggle.
    Boolean,
    /// Reference to an uploaded image (URL or asset key).
    ImageReference,
    /// Nested record with its own schema.
    Object,
    /// Ordered list, optionally with an item schema.
    List,
}

impl FieldKind {
    /// Wire name, as used in YAML definitions and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "long-text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::ImageReference => "image-reference",
            Self::Object => "object",
            Self::List => "list",
        }
    }

    /// Whether this kind carries nested fields.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Object | Self::List)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single editable field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSchema {
    /// Single-line text.
    Text {
        /// Default value.
        default: String,
    },
    /// Multi-line text.
    LongText {
        /// Default value.
        default: String,
    },
    /// Number.
    Number {
        /// Default value.
        default: serde_json::Number,
    },
    /// Boolean.
    Boolean {
        /// Default value.
        default: bool,
    },
    /// Image reference.
    ImageReference {
        /// Default value (usually empty).
        default: String,
    },
    /// Nested object. Its default is built by defaulting every nested field.
    Object {
        /// Nested field schema.
        fields: Box<ComponentSchema>,
    },
    /// List of values.
    List {
        /// Schema each element is expected to follow, if declared.
        items: Option<Box<ComponentSchema>>,
        /// Default elements (empty unless declared).
        default: Vec<Value>,
    },
}

impl FieldSchema {
    /// Text field with the given default.
    pub fn text(default: impl Into<String>) -> Self {
        Self::Text {
            default: default.into(),
        }
    }

    /// Long-text field with the given default.
    pub fn long_text(default: impl Into<String>) -> Self {
        Self::LongText {
            default: default.into(),
        }
    }

    /// Integer number field.
    pub fn number(default: i64) -> Self {
        Self::Number {
            default: default.into(),
        }
    }

    /// Boolean field.
    pub fn boolean(default: bool) -> Self {
        Self::Boolean { default }
    }

    /// Image reference field with an empty default.
    pub fn image() -> Self {
        Self::ImageReference {
            default: String::new(),
        }
    }

    /// Nested object field.
    pub fn object(fields: ComponentSchema) -> Self {
        Self::Object {
            fields: Box::new(fields),
        }
    }

    /// List field with an item schema and no default elements.
    pub fn list_of(items: ComponentSchema) -> Self {
        Self::List {
            items: Some(Box::new(items)),
            default: Vec::new(),
        }
    }

    /// The field's kind.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text { .. } => FieldKind::Text,
            Self::LongText { .. } => FieldKind::LongText,
            Self::Number { .. } => FieldKind::Number,
            Self::Boolean { .. } => FieldKind::Boolean,
            Self::ImageReference { .. } => FieldKind::ImageReference,
            Self::Object { .. } => FieldKind::Object,
            Self::List { .. } => FieldKind::List,
        }
    }

    /// The default value for this field.
    ///
    /// Object fields produce a fresh object with every nested field
    /// defaulted, recursively.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Text { default } | Self::LongText { default } => Value::String(default.clone()),
            Self::ImageReference { default } => Value::String(default.clone()),
            Self::Number { default } => Value::Number(default.clone()),
            Self::Boolean { default } => Value::Bool(*default),
            Self::Object { fields } => fields.default_record(),
            Self::List { default, .. } => Value::Array(default.clone()),
        }
    }
}

/// Ordered mapping of field name to [`FieldSchema`].
///
/// Insertion order is schema order. Field names are unique; adding a field
/// whose name already exists replaces it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentSchema {
    fields: Vec<(String, FieldSchema)>,
}

impl ComponentSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field addition.
    pub fn field(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.insert(name, schema);
        self
    }

    /// Add or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, schema: FieldSchema) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.fields.push((name, schema)),
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }

    /// Iterate fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Field names in schema order.
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A record holding every declared field at its default.
    pub fn default_record(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, schema)| (name.clone(), schema.default_value()))
            .collect();
        Value::Object(map)
    }
}
