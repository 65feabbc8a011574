//! # Section Lifecycle Manager
//!
//! Owns the draft/published pair of every section. Each operation is split
//! into a pure *plan* step, which reads the current record and computes the
//! next one, and a *commit* step, which writes it with a single
//! revision-guarded [`SectionStore::replace`]. Callers that persist
//! elsewhere first (the HTTP layer writing Postgres) run the two steps
//! themselves; everyone else uses [`SectionLifecycle::update_draft`] and
//! [`SectionLifecycle::publish`], which retry lost races.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use pcms_core::{CanonicalizationError, OrgId, PageId, SectionId};
use pcms_schema::{normalize_with, NormalizeOptions, SchemaRegistry};

use crate::section::{NewSection, Section, SectionStatus, SectionTransition, TransitionTrigger};
use crate::store::{SectionStore, StoreError};

/// Default number of re-plans after a revision conflict.
pub const DEFAULT_MAX_RETRIES: usize = 8;

/// Errors from lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// No section with this id.
    #[error("section {0} not found")]
    NotFound(SectionId),

    /// The store rejected or failed the write. Nothing was changed.
    #[error("section store error: {0}")]
    Store(#[from] StoreError),

    /// Content could not be digested for the transition record.
    #[error("content digest failed: {0}")]
    Digest(#[from] CanonicalizationError),
}

impl LifecycleError {
    /// Whether the failure was a lost optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::RevisionConflict { .. }))
    }
}

/// A planned change, not yet written.
#[derive(Debug, Clone)]
pub struct PendingCommit {
    expected_revision: u64,
    next: Section,
    transition: Option<SectionTransition>,
}

impl PendingCommit {
    /// Revision the plan was computed against.
    pub fn expected_revision(&self) -> u64 {
        self.expected_revision
    }

    /// The record that will be stored.
    pub fn next(&self) -> &Section {
        &self.next
    }

    /// The transition this commit performs; `None` for a no-op.
    pub fn transition(&self) -> Option<&SectionTransition> {
        self.transition.as_ref()
    }

    /// Whether committing changes nothing.
    pub fn is_noop(&self) -> bool {
        self.transition.is_none()
    }
}

/// Result of a committed operation.
#[derive(Debug, Clone)]
pub struct Committed {
    /// The section as stored after the operation.
    pub section: Section,
    /// The transition performed; `None` when the operation was a no-op.
    pub transition: Option<SectionTransition>,
}

/// Section lifecycle over a [`SectionStore`].
pub struct SectionLifecycle<S> {
    store: S,
    registry: Arc<SchemaRegistry>,
    options: NormalizeOptions,
    max_retries: usize,
}

impl<S: SectionStore> SectionLifecycle<S> {
    /// Create a lifecycle manager with default normalization options.
    pub fn new(store: S, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            store,
            registry,
            options: NormalizeOptions::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the normalization options applied to drafts.
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the retry bound for revision conflicts.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The schema registry drafts are normalized against.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Normalize content for a component with this manager's options.
    pub fn normalize(&self, component: &str, content: Value) -> Value {
        normalize_with(&self.registry, component, content, &self.options)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch a section.
    pub fn get(&self, id: SectionId) -> Result<Section, LifecycleError> {
        self.store.get(id)?.ok_or(LifecycleError::NotFound(id))
    }

    /// All sections of a page.
    pub fn list_page(&self, org_id: OrgId, page_id: PageId) -> Result<Vec<Section>, LifecycleError> {
        Ok(self.store.list_page(org_id, page_id)?)
    }

    // ── Provisioning ─────────────────────────────────────────────────

    /// Build a new section without storing it.
    pub fn plan_provision(
        &self,
        mut new: NewSection,
    ) -> Result<(Section, SectionTransition), LifecycleError> {
        let content = new
            .content
            .take()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let draft = self.normalize(&new.component, content);
        let section = Section::provisioned(new, draft, Utc::now());
        let transition = section.transition_from(None, TransitionTrigger::Provisioned)?;
        Ok((section, transition))
    }

    /// Normalize the initial draft and insert a new section.
    pub fn provision(&self, new: NewSection) -> Result<Committed, LifecycleError> {
        let (section, transition) = self.plan_provision(new)?;
        self.store.insert(section.clone())?;
        tracing::info!(
            section_id = %section.id,
            component = %section.component,
            key = %section.key,
            "section provisioned"
        );
        Ok(Committed {
            section,
            transition: Some(transition),
        })
    }

    /// Insert an already-built section, e.g. one persisted elsewhere first.
    pub fn insert(&self, section: Section) -> Result<(), LifecycleError> {
        Ok(self.store.insert(section)?)
    }

    // ── Planning ─────────────────────────────────────────────────────

    /// Plan replacing the draft of a section with normalized `content`.
    ///
    /// Replacing the draft with its current (normalized) value is a no-op.
    pub fn plan_draft_update(
        &self,
        id: SectionId,
        content: Value,
    ) -> Result<PendingCommit, LifecycleError> {
        let current = self.get(id)?;
        let normalized = self.normalize(&current.component, content);
        if normalized == current.draft_content {
            return Ok(PendingCommit {
                expected_revision: current.revision,
                next: current,
                transition: None,
            });
        }
        let next = current.with_draft(normalized, Utc::now());
        let transition = next.transition_from(Some(&current), TransitionTrigger::DraftEdited)?;
        Ok(PendingCommit {
            expected_revision: current.revision,
            next,
            transition: Some(transition),
        })
    }

    /// Plan publishing the current draft.
    ///
    /// Publishing a section that is already `published` is a no-op.
    pub fn plan_publish(&self, id: SectionId) -> Result<PendingCommit, LifecycleError> {
        let current = self.get(id)?;
        if current.status == SectionStatus::Published {
            return Ok(PendingCommit {
                expected_revision: current.revision,
                next: current,
                transition: None,
            });
        }
        let next = current.published(Utc::now());
        let transition = next.transition_from(Some(&current), TransitionTrigger::Published)?;
        Ok(PendingCommit {
            expected_revision: current.revision,
            next,
            transition: Some(transition),
        })
    }

    // ── Committing ───────────────────────────────────────────────────

    /// Write a planned change.
    ///
    /// On any error the stored section is left exactly as it was.
    pub fn commit(&self, pending: PendingCommit) -> Result<Committed, LifecycleError> {
        let PendingCommit {
            expected_revision,
            next,
            transition,
        } = pending;

        let Some(transition) = transition else {
            return Ok(Committed {
                section: next,
                transition: None,
            });
        };

        self.store.replace(expected_revision, next.clone())?;
        tracing::info!(
            section_id = %next.id,
            trigger = %transition.trigger,
            from = ?transition.from,
            to = %transition.to,
            revision = next.revision,
            "section transition committed"
        );
        Ok(Committed {
            section: next,
            transition: Some(transition),
        })
    }

    /// Replace the draft, retrying lost races.
    pub fn update_draft(&self, id: SectionId, content: Value) -> Result<Committed, LifecycleError> {
        self.with_retry(id, || self.plan_draft_update(id, content.clone()))
    }

    /// Publish the current draft, retrying lost races.
    pub fn publish(&self, id: SectionId) -> Result<Committed, LifecycleError> {
        self.with_retry(id, || self.plan_publish(id))
    }

    /// Remove a section entirely.
    pub fn remove(&self, id: SectionId) -> Result<Section, LifecycleError> {
        let removed = self.store.remove(id).map_err(|e| match e {
            StoreError::NotFound(id) => LifecycleError::NotFound(id),
            other => LifecycleError::Store(other),
        })?;
        tracing::info!(section_id = %id, "section removed");
        Ok(removed)
    }

    fn with_retry(
        &self,
        id: SectionId,
        mut plan: impl FnMut() -> Result<PendingCommit, LifecycleError>,
    ) -> Result<Committed, LifecycleError> {
        let mut conflicts = 0;
        loop {
            match self.commit(plan()?) {
                Err(e) if e.is_conflict() && conflicts < self.max_retries => {
                    conflicts += 1;
                    tracing::debug!(section_id = %id, attempt = conflicts, "revision conflict, re-planning");
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySectionStore;
    use pcms_core::{PageSlug, SectionKey};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn new_promo(content: Option<Value>) -> NewSection {
        NewSection {
            org_id: OrgId::new(),
            page_id: PageId::new(),
            page_slug: PageSlug::new("home").unwrap(),
            key: SectionKey::new("promo").unwrap(),
            component: "PromoCard".to_string(),
            label: "Promo".to_string(),
            content,
        }
    }

    fn lifecycle() -> SectionLifecycle<MemorySectionStore> {
        SectionLifecycle::new(MemorySectionStore::new(), Arc::new(SchemaRegistry::builtin()))
    }

    /// Store whose `replace` fails on demand.
    #[derive(Default)]
    struct FailingStore {
        inner: MemorySectionStore,
        fail_replace: AtomicBool,
    }

    impl SectionStore for FailingStore {
        fn get(&self, id: SectionId) -> Result<Option<Section>, StoreError> {
            self.inner.get(id)
        }
        fn insert(&self, section: Section) -> Result<(), StoreError> {
            self.inner.insert(section)
        }
        fn replace(&self, expected: u64, next: Section) -> Result<(), StoreError> {
            if self.fail_replace.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.replace(expected, next)
        }
        fn remove(&self, id: SectionId) -> Result<Section, StoreError> {
            self.inner.remove(id)
        }
        fn list_page(&self, org: OrgId, page: PageId) -> Result<Vec<Section>, StoreError> {
            self.inner.list_page(org, page)
        }
    }

    /// Store that reports a conflict for the first `conflicts` replaces.
    struct ContendedStore {
        inner: MemorySectionStore,
        conflicts: AtomicUsize,
    }

    impl SectionStore for ContendedStore {
        fn get(&self, id: SectionId) -> Result<Option<Section>, StoreError> {
            self.inner.get(id)
        }
        fn insert(&self, section: Section) -> Result<(), StoreError> {
            self.inner.insert(section)
        }
        fn replace(&self, expected: u64, next: Section) -> Result<(), StoreError> {
            if self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::RevisionConflict {
                    id: next.id,
                    expected,
                    actual: expected + 1,
                });
            }
            self.inner.replace(expected, next)
        }
        fn remove(&self, id: SectionId) -> Result<Section, StoreError> {
            self.inner.remove(id)
        }
        fn list_page(&self, org: OrgId, page: PageId) -> Result<Vec<Section>, StoreError> {
            self.inner.list_page(org, page)
        }
    }

    #[test]
    fn provision_normalizes_initial_draft() {
        let lc = lifecycle();
        let committed = lc
            .provision(new_promo(Some(json!({"eyebrow": "SPECIAL"}))))
            .unwrap();
        assert_eq!(
            committed.section.draft_content,
            json!({"eyebrow": "SPECIAL", "ctaLabel": "ORDER NOW"})
        );
        assert_eq!(committed.section.status, SectionStatus::Draft);
        assert_eq!(
            committed.transition.map(|t| t.trigger),
            Some(TransitionTrigger::Provisioned)
        );
    }

    #[test]
    fn draft_updates_are_normalized_before_storage() {
        let lc = lifecycle();
        let id = lc.provision(new_promo(None)).unwrap().section.id;
        lc.update_draft(id, json!({"ctaLabel": "BOOK", "extra": true}))
            .unwrap();
        assert_eq!(
            lc.get(id).unwrap().draft_content,
            json!({"eyebrow": "EXPLORE", "ctaLabel": "BOOK", "extra": true})
        );
    }

    #[test]
    fn status_follows_edits_and_publishes() {
        let lc = lifecycle();
        let id = lc.provision(new_promo(None)).unwrap().section.id;

        let s = lc.update_draft(id, json!({"eyebrow": "A"})).unwrap().section;
        assert_eq!(s.status, SectionStatus::Draft);

        let s = lc.publish(id).unwrap().section;
        assert_eq!(s.status, SectionStatus::Published);

        let s = lc.update_draft(id, json!({"eyebrow": "B"})).unwrap().section;
        assert_eq!(s.status, SectionStatus::Dirty);

        let s = lc.update_draft(id, json!({"eyebrow": "A"})).unwrap().section;
        assert_eq!(s.status, SectionStatus::Published);
    }

    #[test]
    fn dirty_section_publishes_to_equal_snapshots() {
        let lc = lifecycle();
        let id = lc.provision(new_promo(None)).unwrap().section.id;
        lc.publish(id).unwrap();
        lc.update_draft(id, json!({"eyebrow": "SPRING"})).unwrap();
        assert_eq!(lc.get(id).unwrap().status, SectionStatus::Dirty);

        let committed = lc.publish(id).unwrap();
        let s = lc.get(id).unwrap();
        assert_eq!(s.status, SectionStatus::Published);
        assert_eq!(s.published_content.as_ref(), Some(&s.draft_content));
        let t = committed.transition.unwrap();
        assert_eq!(t.from, Some(SectionStatus::Dirty));
        assert_eq!(t.to, SectionStatus::Published);
    }

    #[test]
    fn publishing_published_section_is_noop() {
        let lc = lifecycle();
        let id = lc.provision(new_promo(None)).unwrap().section.id;
        let first = lc.publish(id).unwrap().section;
        let again = lc.publish(id).unwrap();
        assert!(again.transition.is_none());
        assert_eq!(again.section.revision, first.revision);
    }

    #[test]
    fn identical_draft_is_noop() {
        let lc = lifecycle();
        let created = lc.provision(new_promo(None)).unwrap().section;
        let pending = lc
            .plan_draft_update(created.id, json!({"eyebrow": "EXPLORE"}))
            .unwrap();
        assert!(pending.is_noop());
        let committed = lc.commit(pending).unwrap();
        assert_eq!(committed.section.revision, created.revision);
    }

    #[test]
    fn failed_publish_leaves_section_unchanged() {
        let lc = SectionLifecycle::new(FailingStore::default(), Arc::new(SchemaRegistry::builtin()));
        let id = lc.provision(new_promo(None)).unwrap().section.id;
        lc.publish(id).unwrap();
        lc.update_draft(id, json!({"eyebrow": "NEW"})).unwrap();
        let before = lc.get(id).unwrap();
        assert_eq!(before.status, SectionStatus::Dirty);

        lc.store().fail_replace.store(true, Ordering::SeqCst);
        let err = lc.publish(id).unwrap_err();
        assert!(matches!(err, LifecycleError::Store(StoreError::Unavailable(_))));

        let after = lc.get(id).unwrap();
        assert_eq!(after, before);
        assert_eq!(after.draft_content, json!({"eyebrow": "NEW", "ctaLabel": "ORDER NOW"}));
        assert_eq!(
            after.published_content,
            Some(json!({"eyebrow": "EXPLORE", "ctaLabel": "ORDER NOW"}))
        );
        assert_eq!(after.status, SectionStatus::Dirty);
    }

    #[test]
    fn conflicts_are_retried_within_bound() {
        let store = ContendedStore {
            inner: MemorySectionStore::new(),
            conflicts: AtomicUsize::new(0),
        };
        let lc = SectionLifecycle::new(store, Arc::new(SchemaRegistry::builtin())).with_max_retries(2);
        let id = lc.provision(new_promo(None)).unwrap().section.id;

        lc.store().conflicts.store(2, Ordering::SeqCst);
        assert!(lc.publish(id).is_ok());

        lc.update_draft(id, json!({"eyebrow": "X"})).unwrap();
        lc.store().conflicts.store(3, Ordering::SeqCst);
        let err = lc.publish(id).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(lc.get(id).unwrap().status, SectionStatus::Dirty);
    }

    #[test]
    fn concurrent_edits_all_land() {
        let lc = Arc::new(lifecycle());
        let id = lc.provision(new_promo(None)).unwrap().section.id;

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let lc = Arc::clone(&lc);
                std::thread::spawn(move || {
                    lc.update_draft(id, json!({"eyebrow": format!("writer-{i}")}))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(lc.get(id).unwrap().revision, 5);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let lc = lifecycle();
        let id = SectionId::new();
        assert!(matches!(lc.remove(id), Err(LifecycleError::NotFound(_))));
        assert!(matches!(lc.get(id), Err(LifecycleError::NotFound(_))));
    }
}
