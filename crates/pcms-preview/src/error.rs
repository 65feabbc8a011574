//! Preview error types.

use thiserror::Error;

/// Why a preview token was rejected.
///
/// The variants are distinguished in logs only. Callers outside the process
/// see a single rejection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRejection {
    /// The token was never issued, or has already been pruned.
    #[error("unknown preview token")]
    Unknown,
    /// The token was presented at or after its expiry.
    #[error("preview token expired")]
    Expired,
    /// The token was issued for a different section.
    #[error("preview token scope mismatch")]
    ScopeMismatch,
}

impl TokenRejection {
    /// Label used in log fields and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Expired => "expired",
            Self::ScopeMismatch => "scope_mismatch",
        }
    }
}

/// Errors raised while setting up or driving a preview.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// The configured renderer base URL cannot carry query parameters.
    #[error("invalid renderer URL \"{url}\": {reason}")]
    InvalidRendererUrl {
        /// The rejected URL.
        url: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A token could not be obtained.
    #[error("preview token request failed: {0}")]
    TokenRequest(String),
}
