#![deny(missing_docs)]

//! # pcms-core: Foundational Types for the Page-Section Content Service
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies; it uses only `serde`, `serde_json`, `serde_jcs`, `thiserror`,
//! `uuid`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** An [`OrgId`] cannot be passed where
//!    a [`SectionId`] is expected. Slot names ([`SectionKey`]) and page slugs
//!    ([`PageSlug`]) validate their format at construction.
//!
//! 2. **[`CanonicalBytes`] is the sole path to digest computation.** Content
//!    digests are computed over RFC 8785 canonical JSON, so two structurally
//!    equal content records always produce the same [`ContentDigest`].
//!
//! 3. **[`PcmsError`] hierarchy.** Structured errors with `thiserror`.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;

pub use canonical::CanonicalBytes;
pub use digest::{content_digest, sha256_digest, sha256_raw, ContentDigest};
pub use error::{CanonicalizationError, PcmsError, ValidationError};
pub use identity::{OrgId, PageId, PageSlug, SectionId, SectionKey};
