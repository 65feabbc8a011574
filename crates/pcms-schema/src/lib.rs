//! # pcms-schema: Component Schemas & Content Normalization
//!
//! Every page section names a *component type* (`HeroBanner`, `PromoCard`,
//! ...). This crate owns the declarative description of each component's
//! editable fields and the pure transform that reconciles arbitrary stored
//! content against that description.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry`] maps component names to [`ComponentSchema`]s. Lookup is
//! pure; an unknown component is `None`, never an error, because content for
//! component types that predate schema coverage must still round-trip.
//!
//! ## Normalizer (`normalize`)
//!
//! [`normalize`] fills absent or null fields with their declared defaults,
//! recursing into nested objects, and preserves every key it does not know.
//! It never fails. List elements are left alone unless the caller opts into
//! [`ListItemPolicy::NormalizeItems`].
//!
//! ## Definitions (`definition`)
//!
//! Components beyond the built-in set are declared in YAML files and loaded
//! with [`SchemaRegistry::load_dir`]. Definitions are validated before they
//! reach the registry.
//!
//! ## JSON Schema (`json_schema`)
//!
//! [`to_json_schema`] renders a component as a Draft 2020-12 document for
//! form generation, and [`lint`] reports advisory type mismatches. Lint
//! findings never block a save.

pub mod builtin;
pub mod definition;
pub mod field;
pub mod json_schema;
pub mod normalize;
pub mod registry;

pub use definition::{ComponentDefinition, FieldDefinition, SchemaDefinitionError};
pub use field::{ComponentSchema, FieldKind, FieldSchema};
pub use json_schema::{lint, to_json_schema, LintFinding};
pub use normalize::{normalize, normalize_with, ListItemPolicy, NormalizeOptions};
pub use registry::SchemaRegistry;
