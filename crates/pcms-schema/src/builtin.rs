//! Built-in component set.
//!
//! These ship with every registry. A YAML definition with the same name
//! replaces the built-in.

use serde_json::json;

use crate::field::{ComponentSchema, FieldSchema};

/// Names and schemas of every built-in component, in no particular order.
pub fn components() -> Vec<(&'static str, ComponentSchema)> {
    vec![
        ("HeroBanner", hero_banner()),
        ("PromoCard", promo_card()),
        ("RichText", rich_text()),
        ("Gallery", gallery()),
        ("FeatureGrid", feature_grid()),
        ("ContactBlock", contact_block()),
        ("OpeningHours", opening_hours()),
    ]
}

fn hero_banner() -> ComponentSchema {
    ComponentSchema::new()
        .field("heading", FieldSchema::text("Welcome"))
        .field("subheading", FieldSchema::long_text(""))
        .field("backgroundImage", FieldSchema::image())
        .field("ctaLabel", FieldSchema::text("LEARN MORE"))
        .field("ctaHref", FieldSchema::text("/"))
}

fn promo_card() -> ComponentSchema {
    ComponentSchema::new()
        .field("eyebrow", FieldSchema::text("EXPLORE"))
        .field("ctaLabel", FieldSchema::text("ORDER NOW"))
}

fn rich_text() -> ComponentSchema {
    ComponentSchema::new().field("body", FieldSchema::long_text(""))
}

fn gallery() -> ComponentSchema {
    ComponentSchema::new()
        .field("title", FieldSchema::text(""))
        .field(
            "images",
            FieldSchema::list_of(
                ComponentSchema::new()
                    .field("src", FieldSchema::image())
                    .field("alt", FieldSchema::text(""))
                    .field("caption", FieldSchema::text("")),
            ),
        )
}

fn feature_grid() -> ComponentSchema {
    ComponentSchema::new()
        .field("heading", FieldSchema::text(""))
        .field("columns", FieldSchema::number(3))
        .field(
            "features",
            FieldSchema::list_of(
                ComponentSchema::new()
                    .field("icon", FieldSchema::image())
                    .field("title", FieldSchema::text(""))
                    .field("description", FieldSchema::long_text("")),
            ),
        )
}

fn contact_block() -> ComponentSchema {
    ComponentSchema::new()
        .field("heading", FieldSchema::text("Contact us"))
        .field("phone", FieldSchema::text(""))
        .field("email", FieldSchema::text(""))
        .field("showMap", FieldSchema::boolean(true))
        .field(
            "address",
            FieldSchema::object(
                ComponentSchema::new()
                    .field("street", FieldSchema::text(""))
                    .field("city", FieldSchema::text(""))
                    .field("postalCode", FieldSchema::text(""))
                    .field("country", FieldSchema::text("")),
            ),
        )
}

fn opening_hours() -> ComponentSchema {
    let days = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    let default = days
        .iter()
        .map(|day| json!({"day": day, "open": "09:00", "close": "17:00", "closed": false}))
        .collect();

    ComponentSchema::new()
        .field("heading", FieldSchema::text("Opening hours"))
        .field("note", FieldSchema::long_text(""))
        .field(
            "days",
            FieldSchema::List {
                items: Some(Box::new(
                    ComponentSchema::new()
                        .field("day", FieldSchema::text(""))
                        .field("open", FieldSchema::text(""))
                        .field("close", FieldSchema::text(""))
                        .field("closed", FieldSchema::boolean(false)),
                )),
                default,
            },
        )
}
