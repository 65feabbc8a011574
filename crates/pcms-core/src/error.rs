//! # Error Hierarchy
//!
//! Structured error types shared across the workspace, built with `thiserror`.
//! Subsystem crates define their own error enums and convert into
//! [`PcmsError`] where a single top-level type is convenient.

use thiserror::Error;

/// Top-level error type for the content service.
#[derive(Error, Debug)]
pub enum PcmsError {
    /// Canonicalization failure during digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Identifier or slug validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Component schema definition problem.
    #[error("schema definition error: {0}")]
    SchemaDefinition(String),

    /// Section lifecycle violation.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The value could not be serialized to canonical JSON.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A UUID-based identifier failed to parse.
    #[error("invalid {kind} id: \"{value}\"")]
    InvalidId {
        /// Which identifier was being parsed (e.g. "section").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A section key is empty, too long, or contains characters outside
    /// `[A-Za-z0-9_-]`.
    #[error("invalid section key: \"{0}\" (expected 1-64 characters of [A-Za-z0-9_-])")]
    InvalidSectionKey(String),

    /// A page slug is malformed.
    #[error("invalid page slug: \"{0}\" (expected lowercase [a-z0-9-] segments separated by '/')")]
    InvalidPageSlug(String),
}
