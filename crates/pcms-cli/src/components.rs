//! # Schema Inspection
//!
//! `pcms components` lists what the registry knows; `pcms schema` prints one
//! component either in the YAML definition format or as JSON Schema.

use anyhow::{Context, Result};
use clap::Args;

use pcms_schema::{to_json_schema, ComponentDefinition, SchemaRegistry};

use crate::require_component;

/// Arguments for `pcms schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Component type name.
    pub component: String,

    /// Print the JSON Schema instead of the YAML definition.
    #[arg(long)]
    pub json_schema: bool,
}

/// One line per component: name followed by its top-level field keys.
pub fn render_component_list(registry: &SchemaRegistry) -> String {
    let names = registry.component_names();
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    names
        .iter()
        .map(|name| {
            format!(
                "{name:<width$}  {}\n",
                registry.field_keys(name).join(", ")
            )
        })
        .collect()
}

/// Execute `pcms components`.
pub fn run_components(registry: &SchemaRegistry) -> Result<u8> {
    print!("{}", render_component_list(registry));
    Ok(0)
}

/// Render one component for `pcms schema`.
pub fn render_schema(registry: &SchemaRegistry, args: &SchemaArgs) -> Result<String> {
    require_component(registry, &args.component)?;
    let Some(schema) = registry.get_schema(&args.component) else {
        anyhow::bail!("unknown component \"{}\"", args.component);
    };
    if args.json_schema {
        let document = to_json_schema(&args.component, schema);
        serde_json::to_string_pretty(&document).context("encoding JSON Schema")
    } else {
        let definition = ComponentDefinition::from_schema(&args.component, schema);
        serde_yaml::to_string(&definition).context("encoding definition")
    }
}

/// Execute `pcms schema`.
pub fn run_schema(registry: &SchemaRegistry, args: &SchemaArgs) -> Result<u8> {
    println!("{}", render_schema(registry, args)?.trim_end());
    Ok(0)
}
