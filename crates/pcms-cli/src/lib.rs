//! # pcms-cli: Command-Line Tool for Component Schemas
//!
//! Provides the `pcms` command for working with component schemas and
//! content records offline, without a running API.
//!
//! ## Subcommands
//!
//! - `pcms components`: list registered components and their fields.
//! - `pcms schema`: print one component's definition or JSON Schema.
//! - `pcms normalize`: fill schema defaults into a content file.
//! - `pcms lint`: report type mismatches in a content file.
//!
//! ```bash
//! pcms components --dir components/
//! pcms schema PromoCard --json-schema
//! pcms normalize OpeningHours hours.yaml --normalize-list-items
//! pcms lint ContactBlock contact.json
//! ```

pub mod components;
pub mod content;

use std::path::Path;

use anyhow::{Context, Result};
use pcms_schema::SchemaRegistry;
use serde_json::Value;

/// Built-in components, overlaid with YAML definitions from `dir`.
pub fn load_registry(dir: Option<&Path>) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::builtin();
    if let Some(dir) = dir {
        let loaded = registry
            .load_dir(dir)
            .with_context(|| format!("loading component definitions from {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), loaded, "component definitions loaded");
    }
    Ok(registry)
}

/// Read a content record. `.json` files are parsed as JSON, anything else
/// as YAML.
pub fn read_content(path: &Path) -> Result<Value> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {} as YAML", path.display()))
    }
}

/// Fail with a helpful message when `component` is not registered.
pub fn require_component(registry: &SchemaRegistry, component: &str) -> Result<()> {
    if registry.contains(component) {
        return Ok(());
    }
    anyhow::bail!(
        "unknown component \"{component}\" (known: {})",
        registry.component_names().join(", ")
    )
}
