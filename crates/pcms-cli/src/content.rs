//! # Content Records
//!
//! `pcms normalize` fills schema defaults into a content file and prints the
//! result as JSON. `pcms lint` reports where a record disagrees with the
//! component's JSON Schema; findings are advisory, so normalization never
//! depends on them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use pcms_schema::{lint, normalize_with, ListItemPolicy, NormalizeOptions, SchemaRegistry};

use crate::{read_content, require_component};

/// Arguments for `pcms normalize`.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Component type name.
    pub component: String,

    /// Content file (`.json`, otherwise YAML).
    pub file: PathBuf,

    /// Also fill defaults into object elements of item-schema lists.
    #[arg(long)]
    pub normalize_list_items: bool,
}

/// Arguments for `pcms lint`.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Component type name.
    pub component: String,

    /// Content file (`.json`, otherwise YAML).
    pub file: PathBuf,
}

/// Normalize the file named by `args`.
pub fn normalize_file(registry: &SchemaRegistry, args: &NormalizeArgs) -> Result<Value> {
    require_component(registry, &args.component)?;
    let content = read_content(&args.file)?;
    let options = NormalizeOptions {
        list_items: if args.normalize_list_items {
            ListItemPolicy::NormalizeItems
        } else {
            ListItemPolicy::PassThrough
        },
    };
    Ok(normalize_with(registry, &args.component, content, &options))
}

/// Execute `pcms normalize`.
pub fn run_normalize(registry: &SchemaRegistry, args: &NormalizeArgs) -> Result<u8> {
    let normalized = normalize_file(registry, args)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&normalized).context("encoding normalized content")?
    );
    Ok(0)
}

/// Lint the file named by `args`, one line per finding.
pub fn lint_file(registry: &SchemaRegistry, args: &LintArgs) -> Result<Vec<String>> {
    require_component(registry, &args.component)?;
    let content = read_content(&args.file)?;
    let findings = lint(registry, &args.component, &content)
        .with_context(|| format!("linting against {}", args.component))?;
    Ok(findings
        .into_iter()
        .map(|f| {
            let path = if f.instance_path.is_empty() {
                "/"
            } else {
                f.instance_path.as_str()
            };
            format!("{path}: {}", f.message)
        })
        .collect())
}

/// Execute `pcms lint`. Exits 1 when there are findings.
pub fn run_lint(registry: &SchemaRegistry, args: &LintArgs) -> Result<u8> {
    let findings = lint_file(registry, args)?;
    if findings.is_empty() {
        tracing::info!(file = %args.file.display(), "no findings");
        return Ok(0);
    }
    for line in &findings {
        println!("{line}");
    }
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn normalize_fills_defaults_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "promo.yaml", "eyebrow: SPECIAL\nlegacy: 1\n");
        let args = NormalizeArgs {
            component: "PromoCard".into(),
            file,
            normalize_list_items: false,
        };
        let out = normalize_file(&SchemaRegistry::builtin(), &args).unwrap();
        assert_eq!(out["eyebrow"], json!("SPECIAL"));
        assert_eq!(out["ctaLabel"], json!("ORDER NOW"));
        assert_eq!(out["legacy"], json!(1));
    }

    #[test]
    fn list_item_flag_reaches_nested_items() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "gallery.json", r#"{"images": [{"src": "a.png"}]}"#);
        let registry = SchemaRegistry::builtin();

        let mut args = NormalizeArgs {
            component: "Gallery".into(),
            file,
            normalize_list_items: false,
        };
        let passed = normalize_file(&registry, &args).unwrap();
        assert_eq!(passed["images"], json!([{"src": "a.png"}]));

        args.normalize_list_items = true;
        let filled = normalize_file(&registry, &args).unwrap();
        assert_eq!(filled["images"][0]["alt"], json!(""));
        assert_eq!(filled["images"][0]["src"], json!("a.png"));
    }

    #[test]
    fn lint_reports_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "promo.json", r#"{"eyebrow": 7}"#);
        let args = LintArgs {
            component: "PromoCard".into(),
            file,
        };
        let findings = lint_file(&SchemaRegistry::builtin(), &args).unwrap();
        assert!(!findings.is_empty());
        assert!(findings[0].starts_with("/eyebrow"), "{findings:?}");
    }

    #[test]
    fn clean_record_has_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "promo.json", r#"{"eyebrow": "NEW"}"#);
        let args = LintArgs {
            component: "PromoCard".into(),
            file,
        };
        assert!(lint_file(&SchemaRegistry::builtin(), &args)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_component_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "x.json", "{}");
        let args = LintArgs {
            component: "Nope".into(),
            file,
        };
        assert!(lint_file(&SchemaRegistry::builtin(), &args).is_err());
    }
}
