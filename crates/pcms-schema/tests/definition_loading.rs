//! Loading YAML component definitions from a directory.

use std::fs;

use pcms_schema::{normalize, SchemaDefinitionError, SchemaRegistry};
use serde_json::json;

const MENU_TEASER: &str = r#"
component: MenuTeaser
fields:
  - name: title
    kind: text
    default: Tonight's menu
  - name: dishes
    kind: list
    items:
      - name: name
        kind: text
      - name: price
        kind: number
"#;

const PROMO_OVERRIDE: &str = r#"
component: PromoCard
fields:
  - name: eyebrow
    kind: text
    default: DISCOVER
  - name: ctaLabel
    kind: text
    default: ORDER NOW
  - name: badge
    kind: image-reference
"#;

#[test]
fn loads_yaml_and_yml_files_and_ignores_others() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("menu.yaml"), MENU_TEASER).unwrap();
    fs::write(dir.path().join("promo.yml"), PROMO_OVERRIDE).unwrap();
    fs::write(dir.path().join("README.md"), "not a definition").unwrap();

    let mut registry = SchemaRegistry::builtin();
    let loaded = registry.load_dir(dir.path()).unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(registry.field_keys("MenuTeaser"), vec!["title", "dishes"]);

    let out = normalize(&registry, "MenuTeaser", json!({}));
    assert_eq!(out, json!({"title": "Tonight's menu", "dishes": []}));
}

#[test]
fn definition_overrides_builtin() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("promo.yaml"), PROMO_OVERRIDE).unwrap();

    let mut registry = SchemaRegistry::builtin();
    registry.load_dir(dir.path()).unwrap();
    let out = normalize(&registry, "PromoCard", json!({}));
    assert_eq!(
        out,
        json!({"eyebrow": "DISCOVER", "ctaLabel": "ORDER NOW", "badge": ""})
    );
}

#[test]
fn invalid_file_leaves_registry_untouched() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a_menu.yaml"), MENU_TEASER).unwrap();
    fs::write(
        dir.path().join("b_broken.yaml"),
        "component: Broken\nfields:\n  - {name: n, kind: number, default: lots}\n",
    )
    .unwrap();

    let mut registry = SchemaRegistry::builtin();
    let before = registry.len();
    let err = registry.load_dir(dir.path()).unwrap_err();
    assert!(matches!(err, SchemaDefinitionError::DefaultTypeMismatch { .. }));
    assert_eq!(registry.len(), before);
    assert!(!registry.contains("MenuTeaser"));
}

#[test]
fn duplicate_component_across_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("one.yaml"), MENU_TEASER).unwrap();
    fs::write(dir.path().join("two.yaml"), MENU_TEASER).unwrap();

    let mut registry = SchemaRegistry::empty();
    let err = registry.load_dir(dir.path()).unwrap_err();
    assert!(
        matches!(err, SchemaDefinitionError::DuplicateComponent { ref component } if component == "MenuTeaser")
    );
}

#[test]
fn malformed_yaml_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.yaml"), "component: [unterminated").unwrap();

    let mut registry = SchemaRegistry::empty();
    let err = registry.load_dir(dir.path()).unwrap_err();
    match err {
        SchemaDefinitionError::Parse { path, .. } => assert!(path.ends_with("bad.yaml")),
        other => panic!("expected parse error, got {other:?}"),
    }
}
