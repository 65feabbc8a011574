//! # Identity Newtypes
//!
//! Distinct identifier types for organizations, pages, and sections, plus
//! validated string types for the two human-chosen names that appear in
//! preview URLs: the section slot key and the page slug.
//!
//! UUID-based identifiers are always valid by construction. String-based
//! names validate at construction time and on deserialization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// An organization (tenant) owning pages and sections.
    OrgId,
    "organization"
);

uuid_id!(
    /// A website page within an organization.
    PageId,
    "page"
);

uuid_id!(
    /// A single editable section on a page.
    SectionId,
    "section"
);

// ---------------------------------------------------------------------------
// String-based names
// ---------------------------------------------------------------------------

/// Stable slot name of a section within its page (e.g. `hero`, `promo_1`).
///
/// 1-64 characters of `[A-Za-z0-9_-]`. Travels as a URL query parameter to
/// the external renderer, so the character set is deliberately narrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionKey(String);

impl SectionKey {
    /// Validate and wrap a section key.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.len() <= 64
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidSectionKey(s))
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SectionKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionKey> for String {
    fn from(key: SectionKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL path slug of a page (e.g. `home`, `menus/dinner`).
///
/// Lowercase `[a-z0-9-]` segments separated by `/`, no leading, trailing, or
/// doubled separators. The root page uses the slug `index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageSlug(String);

impl PageSlug {
    /// Validate and wrap a page slug.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.len() <= 200
            && s.split('/').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            });
        if valid {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidPageSlug(s))
        }
    }

    /// The slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageSlug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSlug> for String {
    fn from(slug: PageSlug) -> Self {
        slug.0
    }
}

impl std::fmt::Display for PageSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_distinct_and_display_as_uuid() {
        let a = SectionId::new();
        let b = SectionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }

    #[test]
    fn uuid_ids_parse_from_str() {
        let id = OrgId::new();
        let parsed: OrgId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn uuid_id_parse_failure_names_kind() {
        let err = "not-a-uuid".parse::<PageId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidId {
                kind: "page",
                value: "not-a-uuid".to_string()
            }
        );
    }

    #[test]
    fn uuid_ids_serialize_transparently() {
        let uuid = Uuid::new_v4();
        let id = SectionId::from_uuid(uuid);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(uuid.to_string()));
    }

    #[test]
    fn section_key_accepts_slot_names() {
        for key in ["hero", "promo_1", "footer-links", "A1"] {
            assert!(SectionKey::new(key).is_ok(), "{key} should be valid");
        }
    }

    #[test]
    fn section_key_rejects_bad_input() {
        for key in ["", "has space", "semi;colon", "é", &"x".repeat(65)] {
            assert!(SectionKey::new(key).is_err(), "{key:?} should be invalid");
        }
    }

    #[test]
    fn section_key_deserialization_validates() {
        let ok: SectionKey = serde_json::from_str("\"hero\"").unwrap();
        assert_eq!(ok.as_str(), "hero");
        assert!(serde_json::from_str::<SectionKey>("\"bad key\"").is_err());
    }

    #[test]
    fn page_slug_accepts_nested_paths() {
        for slug in ["index", "menus", "menus/dinner", "events/2026-summer"] {
            assert!(PageSlug::new(slug).is_ok(), "{slug} should be valid");
        }
    }

    #[test]
    fn page_slug_rejects_malformed_paths() {
        for slug in ["", "/home", "home/", "a//b", "Home", "a b"] {
            assert!(PageSlug::new(slug).is_err(), "{slug:?} should be invalid");
        }
    }

    #[test]
    fn page_slug_serde_roundtrip_keeps_string_form() {
        let slug = PageSlug::new("menus/dinner").unwrap();
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, "\"menus/dinner\"");
    }
}
