//! # pcms-state: Section Lifecycle
//!
//! A section carries two content snapshots: the draft editors work on and
//! the last published copy. Its status is never stored independently; it is
//! derived by comparing the two:
//!
//! ```text
//!            edit                 edit (differs)
//!   Draft ─────────▶ Draft    Published ──────────▶ Dirty
//!     │                          ▲   ▲                 │
//!     └──────── publish ─────────┘   └──── publish ────┘
//! ```
//!
//! Editing a published section back to its published content returns it to
//! `Published`. There is no terminal state.
//!
//! ## Commits
//!
//! Every change is planned purely ([`SectionLifecycle::plan_draft_update`],
//! [`SectionLifecycle::plan_publish`]) and then committed through a single
//! revision-guarded [`SectionStore::replace`]. A failed write leaves the
//! stored section exactly as it was; a lost race surfaces as
//! [`StoreError::RevisionConflict`] and is retried a bounded number of times.

pub mod lifecycle;
pub mod section;
pub mod store;

pub use lifecycle::{
    Committed, LifecycleError, PendingCommit, SectionLifecycle, DEFAULT_MAX_RETRIES,
};
pub use section::{NewSection, Section, SectionStatus, SectionTransition, TransitionTrigger};
pub use store::{MemorySectionStore, SectionStore, StoreError};
