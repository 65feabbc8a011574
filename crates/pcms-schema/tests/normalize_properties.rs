//! Property tests for the content normalizer over the built-in component set.

use pcms_schema::{normalize, normalize_with, ListItemPolicy, NormalizeOptions, SchemaRegistry};
use proptest::prelude::*;
use serde_json::{json, Value};

const SCHEMA_KEYS: &[&str] = &[
    "eyebrow",
    "ctaLabel",
    "heading",
    "columns",
    "address",
    "city",
    "street",
    "images",
    "src",
    "days",
    "showMap",
];

const ADDRESS_KEYS: &[&str] = &["street", "city", "postalCode", "country", "unit"];

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        prop::sample::select(SCHEMA_KEYS).prop_map(str::to_string),
    ]
}

/// Arbitrary JSON whose object keys often collide with declared field names.
fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn component() -> impl Strategy<Value = String> {
    let registry = SchemaRegistry::builtin();
    let mut names: Vec<String> = registry
        .component_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    names.push("UnknownWidget".to_string());
    prop::sample::select(names)
}

fn policy() -> impl Strategy<Value = NormalizeOptions> {
    prop_oneof![
        Just(ListItemPolicy::PassThrough),
        Just(ListItemPolicy::NormalizeItems)
    ]
    .prop_map(|list_items| NormalizeOptions { list_items })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(name in component(), input in json_value(), options in policy()) {
        let registry = SchemaRegistry::builtin();
        let once = normalize_with(&registry, &name, input, &options);
        let twice = normalize_with(&registry, &name, once.clone(), &options);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn every_declared_key_is_present(name in component(), input in json_value()) {
        let registry = SchemaRegistry::builtin();
        let out = normalize(&registry, &name, input);
        for key in registry.field_keys(&name) {
            prop_assert!(out.get(key).is_some(), "{} missing {}", name, key);
            prop_assert!(!out[key].is_null(), "{} left {} null", name, key);
        }
    }

    #[test]
    fn unknown_keys_are_never_dropped(name in component(), input in json_value()) {
        let registry = SchemaRegistry::builtin();
        let declared = registry.field_keys(&name);
        let out = normalize(&registry, &name, input.clone());
        if let Value::Object(map) = &input {
            for (k, v) in map {
                if !declared.contains(&k.as_str()) {
                    prop_assert_eq!(out.get(k), Some(v));
                }
            }
        }
    }

    #[test]
    fn nested_address_is_always_complete(partial in prop::collection::btree_map(
        prop::sample::select(ADDRESS_KEYS).prop_map(str::to_string),
        json_value(),
        0..5,
    )) {
        let registry = SchemaRegistry::builtin();
        let input = json!({"address": Value::Object(partial.into_iter().collect())});
        let out = normalize(&registry, "ContactBlock", input);
        for key in ["street", "city", "postalCode", "country"] {
            prop_assert!(out["address"].get(key).is_some());
            prop_assert!(!out["address"][key].is_null());
        }
    }
}

#[test]
fn empty_record_yields_exactly_the_declared_defaults() {
    let registry = SchemaRegistry::builtin();
    for name in registry.component_names() {
        let schema = registry.get_schema(name).unwrap();
        let out = normalize(&registry, name, json!({}));
        let keys: Vec<&str> = out
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut declared = registry.field_keys(name);
        declared.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, declared, "{name}");
        assert_eq!(out, schema.default_record(), "{name}");
    }
}

#[test]
fn promo_card_scenario() {
    let registry = SchemaRegistry::builtin();
    let out = normalize(&registry, "PromoCard", json!({"eyebrow": "SPECIAL"}));
    assert_eq!(out, json!({"eyebrow": "SPECIAL", "ctaLabel": "ORDER NOW"}));
}
