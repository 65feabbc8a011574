//! # Section Store
//!
//! The persistence seam for sections. A store must make
//! [`SectionStore::replace`] a single atomic compare-and-swap on the
//! section's revision: either the whole record (draft, published snapshot,
//! status, revision) is replaced, or nothing is.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use pcms_core::{OrgId, PageId, SectionId, SectionKey};

use crate::section::Section;

/// Errors reported by a [`SectionStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No section with this id.
    #[error("section {0} not found")]
    NotFound(SectionId),

    /// The stored revision moved since the caller read it.
    #[error("section {id} revision conflict: expected {expected}, found {actual}")]
    RevisionConflict {
        /// Section id.
        id: SectionId,
        /// Revision the caller planned against.
        expected: u64,
        /// Revision actually stored.
        actual: u64,
    },

    /// A section with this id already exists.
    #[error("section {0} already exists")]
    AlreadyExists(SectionId),

    /// The page already has a section in this slot.
    #[error("page {page_id} already has a section with key \"{key}\"")]
    DuplicateKey {
        /// Page id.
        page_id: PageId,
        /// Slot key.
        key: SectionKey,
    },

    /// The backing store could not complete the write.
    #[error("section store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence seam for sections.
pub trait SectionStore: Send + Sync {
    /// Fetch a section.
    fn get(&self, id: SectionId) -> Result<Option<Section>, StoreError>;

    /// Insert a new section.
    fn insert(&self, section: Section) -> Result<(), StoreError>;

    /// Replace a section if its stored revision equals `expected_revision`.
    fn replace(&self, expected_revision: u64, next: Section) -> Result<(), StoreError>;

    /// Remove a section, returning it.
    fn remove(&self, id: SectionId) -> Result<Section, StoreError>;

    /// All sections of a page, oldest first, ties broken by key. Callers
    /// rely on this order.
    fn list_page(&self, org_id: OrgId, page_id: PageId) -> Result<Vec<Section>, StoreError>;
}

/// In-memory [`SectionStore`].
///
/// All writes take the single write lock, so a `replace` check and swap
/// cannot interleave with another writer.
#[derive(Debug, Default)]
pub struct MemorySectionStore {
    sections: RwLock<HashMap<SectionId, Section>>,
}

impl MemorySectionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sections.
    pub fn len(&self) -> usize {
        self.sections.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sections.read().is_empty()
    }
}

impl SectionStore for MemorySectionStore {
    fn get(&self, id: SectionId) -> Result<Option<Section>, StoreError> {
        Ok(self.sections.read().get(&id).cloned())
    }

    fn insert(&self, section: Section) -> Result<(), StoreError> {
        let mut guard = self.sections.write();
        if guard.contains_key(&section.id) {
            return Err(StoreError::AlreadyExists(section.id));
        }
        if guard
            .values()
            .any(|s| s.page_id == section.page_id && s.key == section.key)
        {
            return Err(StoreError::DuplicateKey {
                page_id: section.page_id,
                key: section.key,
            });
        }
        guard.insert(section.id, section);
        Ok(())
    }

    fn replace(&self, expected_revision: u64, next: Section) -> Result<(), StoreError> {
        let mut guard = self.sections.write();
        let slot = guard
            .get_mut(&next.id)
            .ok_or(StoreError::NotFound(next.id))?;
        if slot.revision != expected_revision {
            return Err(StoreError::RevisionConflict {
                id: next.id,
                expected: expected_revision,
                actual: slot.revision,
            });
        }
        *slot = next;
        Ok(())
    }

    fn remove(&self, id: SectionId) -> Result<Section, StoreError> {
        self.sections
            .write()
            .remove(&id)
            .ok_or(StoreError::NotFound(id))
    }

    fn list_page(&self, org_id: OrgId, page_id: PageId) -> Result<Vec<Section>, StoreError> {
        let mut sections: Vec<Section> = self
            .sections
            .read()
            .values()
            .filter(|s| s.org_id == org_id && s.page_id == page_id)
            .cloned()
            .collect();
        sections.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.key.as_str().cmp(b.key.as_str()))
        });
        Ok(sections)
    }
}
