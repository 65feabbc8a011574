//! # Schema Registry
//!
//! Static map from component type name to [`ComponentSchema`]. Populated at
//! startup (built-ins, then optional YAML definitions) and read-only after
//! that; the API layer shares it behind an `Arc`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::builtin;
use crate::definition::{ComponentDefinition, SchemaDefinitionError};
use crate::field::ComponentSchema;

/// Registry of known component schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    components: BTreeMap<String, ComponentSchema>,
}

impl SchemaRegistry {
    /// A registry with no components.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in component set.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, schema) in builtin::components() {
            registry.register(name, schema);
        }
        registry
    }

    /// Register (or replace) a component schema.
    pub fn register(&mut self, component: impl Into<String>, schema: ComponentSchema) {
        let component = component.into();
        if self.components.insert(component.clone(), schema).is_some() {
            tracing::info!(component = %component, "component schema replaced");
        }
    }

    /// Validate a definition and register the resulting schema.
    pub fn register_definition(
        &mut self,
        definition: &ComponentDefinition,
    ) -> Result<(), SchemaDefinitionError> {
        let schema = definition.to_schema()?;
        self.register(definition.component.clone(), schema);
        Ok(())
    }

    /// Load every `*.yaml` / `*.yml` definition in `dir`.
    ///
    /// Files are processed in path order. All files are parsed and validated
    /// before any is registered, so a bad file leaves the registry untouched.
    /// Returns the number of components loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, SchemaDefinitionError> {
        let io_err = |source| SchemaDefinitionError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
            })
            .collect();
        paths.sort();

        let mut seen = HashSet::new();
        let mut loaded = Vec::with_capacity(paths.len());
        for path in &paths {
            let display = path.display().to_string();
            let source =
                std::fs::read_to_string(path).map_err(|source| SchemaDefinitionError::Io {
                    path: display.clone(),
                    source,
                })?;
            let definition = ComponentDefinition::from_yaml(&source, &display)?;
            if !seen.insert(definition.component.clone()) {
                return Err(SchemaDefinitionError::DuplicateComponent {
                    component: definition.component,
                });
            }
            let schema = definition.to_schema()?;
            loaded.push((definition.component, schema));
        }

        let count = loaded.len();
        for (name, schema) in loaded {
            self.register(name, schema);
        }
        tracing::info!(dir = %dir.display(), count, "loaded component definitions");
        Ok(count)
    }

    /// Schema for a component type, or `None` when unknown.
    pub fn get_schema(&self, component: &str) -> Option<&ComponentSchema> {
        self.components.get(component)
    }

    /// Declared top-level field names in schema order; empty when unknown.
    pub fn field_keys(&self, component: &str) -> Vec<&str> {
        self.get_schema(component)
            .map(ComponentSchema::keys)
            .unwrap_or_default()
    }

    /// All registered component names, sorted.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Whether a component type is registered.
    pub fn contains(&self, component: &str) -> bool {
        self.components.contains_key(component)
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
