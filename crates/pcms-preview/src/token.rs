//! # Preview Token Service
//!
//! Issues short-lived opaque tokens that let the external renderer fetch the
//! draft content of exactly one section.
//!
//! Tokens are 32 bytes from the operating-system RNG, hex encoded. The
//! registry is keyed by the SHA-256 digest of the token, so the raw string
//! never sits in memory after it has been handed out. A token stays valid
//! for repeated fetches until it expires; validation does not consume it.
//!
//! Expired grants are dropped lazily when looked up, and swept on every
//! issuance so the registry cannot grow without bound.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use pcms_core::{sha256_raw, ContentDigest, OrgId, PageId, SectionId};

use crate::error::TokenRejection;

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u32 = 600;

/// The (organization, page, section) triple a token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionScope {
    /// Organization.
    pub org_id: OrgId,
    /// Page.
    pub page_id: PageId,
    /// Section.
    pub section_id: SectionId,
}

/// A freshly issued token. The raw token exists only here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque token string.
    pub token: String,
    /// Bound scope.
    pub scope: SectionScope,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// First instant at which the token is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Grant {
    scope: SectionScope,
    expires_at: DateTime<Utc>,
}

/// In-memory preview token registry.
#[derive(Debug)]
pub struct PreviewTokenService {
    ttl: Duration,
    grants: RwLock<HashMap<ContentDigest, Grant>>,
}

impl Default for PreviewTokenService {
    fn default() -> Self {
        Self::new(Duration::seconds(i64::from(DEFAULT_TOKEN_TTL_SECS)))
    }
}

impl PreviewTokenService {
    /// A service issuing tokens with the given lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            grants: RwLock::new(HashMap::new()),
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `scope`, valid from now.
    pub fn issue(&self, scope: SectionScope) -> IssuedToken {
        self.issue_at(scope, Utc::now())
    }

    /// Issue a token for `scope` as of `now`.
    pub fn issue_at(&self, scope: SectionScope, now: DateTime<Utc>) -> IssuedToken {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let expires_at = now + self.ttl;

        let mut grants = self.grants.write();
        let before = grants.len();
        grants.retain(|_, grant| grant.expires_at > now);
        let swept = before - grants.len();
        grants.insert(sha256_raw(token.as_bytes()), Grant { scope, expires_at });
        drop(grants);

        tracing::debug!(
            section_id = %scope.section_id,
            %expires_at,
            swept,
            "preview token issued"
        );

        IssuedToken {
            token,
            scope,
            issued_at: now,
            expires_at,
        }
    }

    /// Validate a token for `scope` as of now.
    pub fn validate(&self, token: &str, scope: &SectionScope) -> Result<(), TokenRejection> {
        self.validate_at(token, scope, Utc::now())
    }

    /// Validate a token for `scope` as of `now`.
    ///
    /// Accepted only strictly before expiry and only for the exact triple the
    /// token was issued for.
    pub fn validate_at(
        &self,
        token: &str,
        scope: &SectionScope,
        now: DateTime<Utc>,
    ) -> Result<(), TokenRejection> {
        let digest = sha256_raw(token.as_bytes());
        let result = self.check(&digest, scope, now);
        if let Err(rejection) = result {
            if rejection == TokenRejection::Expired {
                self.prune(&digest, now);
            }
            tracing::warn!(
                reason = rejection.as_str(),
                section_id = %scope.section_id,
                "preview token rejected"
            );
        }
        result
    }

    /// Resolve a token to the scope it was issued for, as of now.
    pub fn resolve(&self, token: &str) -> Result<SectionScope, TokenRejection> {
        self.resolve_at(token, Utc::now())
    }

    /// Resolve a token to its bound scope as of `now`.
    ///
    /// The renderer only knows the token plus the page slug and section key
    /// from its URL; the bound triple tells the caller which section that
    /// is. Expiry is enforced the same way as in [`validate_at`].
    ///
    /// [`validate_at`]: Self::validate_at
    pub fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SectionScope, TokenRejection> {
        let digest = sha256_raw(token.as_bytes());
        let result = self.lookup(&digest, now);
        if let Err(rejection) = result {
            if rejection == TokenRejection::Expired {
                self.prune(&digest, now);
            }
            tracing::warn!(reason = rejection.as_str(), "preview token rejected");
        }
        result
    }

    fn lookup(
        &self,
        digest: &ContentDigest,
        now: DateTime<Utc>,
    ) -> Result<SectionScope, TokenRejection> {
        let grants = self.grants.read();
        let grant = grants.get(digest).ok_or(TokenRejection::Unknown)?;
        if now >= grant.expires_at {
            return Err(TokenRejection::Expired);
        }
        Ok(grant.scope)
    }

    fn check(
        &self,
        digest: &ContentDigest,
        scope: &SectionScope,
        now: DateTime<Utc>,
    ) -> Result<(), TokenRejection> {
        if self.lookup(digest, now)? != *scope {
            return Err(TokenRejection::ScopeMismatch);
        }
        Ok(())
    }

    fn prune(&self, digest: &ContentDigest, now: DateTime<Utc>) {
        let mut grants = self.grants.write();
        if grants.get(digest).is_some_and(|g| now >= g.expires_at) {
            grants.remove(digest);
        }
    }

    /// Drop every grant expired as of `now`, returning how many were removed.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut grants = self.grants.write();
        let before = grants.len();
        grants.retain(|_, grant| grant.expires_at > now);
        before - grants.len()
    }

    /// Number of grants currently held, expired or not.
    pub fn outstanding(&self) -> usize {
        self.grants.read().len()
    }
}
