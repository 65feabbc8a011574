//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only input accepted by digest computation. It is
//! produced by serializing a value to JSON and re-emitting it through
//! `serde_jcs` (RFC 8785): sorted keys, compact separators, and a
//! deterministic number format.
//!
//! Section content is structurally arbitrary and may legitimately carry
//! fractional numbers (prices, ratings), so floats are accepted here. JCS
//! gives them a single canonical spelling.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by RFC 8785 canonicalization.
///
/// The inner buffer is private; [`CanonicalBytes::new`] is the only
/// constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::SerializationFailed`] if the value
    /// cannot be represented as JSON (e.g. a map with non-string keys or a
    /// non-finite float).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let bytes = serde_jcs::to_vec(obj)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let cb = CanonicalBytes::new(&json!({"b": 1, "a": 2})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn nested_objects_are_sorted_recursively() {
        let cb = CanonicalBytes::new(&json!({"z": {"y": true, "x": null}, "a": [3, 1]})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":[3,1],"z":{"x":null,"y":true}}"#);
    }

    #[test]
    fn floats_are_accepted() {
        let cb = CanonicalBytes::new(&json!({"price": 12.5})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"price":12.5}"#);
    }

    #[test]
    fn equal_structures_produce_equal_bytes() {
        let a = CanonicalBytes::new(&json!({"eyebrow": "SPECIAL", "ctaLabel": "ORDER NOW"})).unwrap();
        let b = CanonicalBytes::new(&json!({"ctaLabel": "ORDER NOW", "eyebrow": "SPECIAL"})).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert_eq!(a.len(), a.as_ref().len());
    }
}
