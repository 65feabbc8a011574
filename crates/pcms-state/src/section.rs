//! # Section Record
//!
//! The section record, its derived status, and the transition record emitted
//! for every committed change. All state changes are computed as new values
//! from the current one; nothing here touches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pcms_core::{
    content_digest, CanonicalizationError, ContentDigest, OrgId, PageId, PageSlug, SectionId,
    SectionKey,
};

// ─── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a section, derived from its two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Never published.
    Draft,
    /// Draft is structurally equal to the published snapshot.
    Published,
    /// Published before, but the draft has since diverged.
    Dirty,
}

impl SectionStatus {
    /// Derive the status from the draft and the published snapshot.
    pub fn derive(draft: &Value, published: Option<&Value>) -> Self {
        match published {
            None => Self::Draft,
            Some(published) if published == draft => Self::Published,
            Some(_) => Self::Dirty,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Dirty => "dirty",
        }
    }
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transitions ─────────────────────────────────────────────────────

/// What caused a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// The section was created.
    Provisioned,
    /// The draft was replaced.
    DraftEdited,
    /// The draft was copied into the published snapshot.
    Published,
}

impl std::fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Provisioned => "provisioned",
            Self::DraftEdited => "draft_edited",
            Self::Published => "published",
        })
    }
}

/// Record of a committed section change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTransition {
    /// Section that changed.
    pub section_id: SectionId,
    /// Status before the change; `None` on provisioning.
    pub from: Option<SectionStatus>,
    /// Status after the change.
    pub to: SectionStatus,
    /// Cause of the change.
    pub trigger: TransitionTrigger,
    /// Revision after the change.
    pub revision: u64,
    /// Digest of the draft content after the change.
    pub content_digest: ContentDigest,
    /// When the change was computed.
    pub at: DateTime<Utc>,
}

// ─── Section ─────────────────────────────────────────────────────────

/// Request to create a section on a page.
#[derive(Debug, Clone)]
pub struct NewSection {
    /// Owning organization.
    pub org_id: OrgId,
    /// Owning page.
    pub page_id: PageId,
    /// Slug of the owning page, used in preview URLs.
    pub page_slug: PageSlug,
    /// Slot name within the page.
    pub key: SectionKey,
    /// Component type name.
    pub component: String,
    /// Human label shown to editors.
    pub label: String,
    /// Initial draft content; normalized before insert. `None` means `{}`.
    pub content: Option<Value>,
}

/// A unit of editable content on a page.
///
/// `status` is a cache of [`SectionStatus::derive`] over the two snapshots
/// and is recomputed by every constructor in this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier.
    pub id: SectionId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Owning page.
    pub page_id: PageId,
    /// Slug of the owning page.
    pub page_slug: PageSlug,
    /// Slot name within the page.
    pub key: SectionKey,
    /// Component type name.
    pub component: String,
    /// Human label.
    pub label: String,
    /// Content being edited.
    pub draft_content: Value,
    /// Last published snapshot.
    pub published_content: Option<Value>,
    /// Derived status.
    pub status: SectionStatus,
    /// Bumped on every committed change.
    pub revision: u64,
    /// Time of the last publish.
    pub published_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last committed change.
    pub updated_at: DateTime<Utc>,
}

impl Section {
    /// Build a freshly provisioned section at revision 1.
    ///
    /// `draft` is expected to be normalized already.
    pub fn provisioned(new: NewSection, draft: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: SectionId::new(),
            org_id: new.org_id,
            page_id: new.page_id,
            page_slug: new.page_slug,
            key: new.key,
            component: new.component,
            label: new.label,
            draft_content: draft,
            published_content: None,
            status: SectionStatus::Draft,
            revision: 1,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The record after replacing the draft.
    pub fn with_draft(&self, content: Value, now: DateTime<Utc>) -> Self {
        let status = SectionStatus::derive(&content, self.published_content.as_ref());
        Self {
            draft_content: content,
            status,
            revision: self.revision + 1,
            updated_at: now,
            ..self.clone()
        }
    }

    /// The record after publishing the current draft.
    pub fn published(&self, now: DateTime<Utc>) -> Self {
        Self {
            published_content: Some(self.draft_content.clone()),
            status: SectionStatus::Published,
            revision: self.revision + 1,
            published_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Recompute the cached status, e.g. after loading from storage.
    pub fn with_derived_status(mut self) -> Self {
        self.status = SectionStatus::derive(&self.draft_content, self.published_content.as_ref());
        self
    }

    /// Transition record describing how `self` was reached from `previous`.
    pub fn transition_from(
        &self,
        previous: Option<&Section>,
        trigger: TransitionTrigger,
    ) -> Result<SectionTransition, CanonicalizationError> {
        Ok(SectionTransition {
            section_id: self.id,
            from: previous.map(|p| p.status),
            to: self.status,
            trigger,
            revision: self.revision,
            content_digest: content_digest(&self.draft_content)?,
            at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(draft: Value) -> Section {
        Section::provisioned(
            NewSection {
                org_id: OrgId::new(),
                page_id: PageId::new(),
                page_slug: PageSlug::new("home").unwrap(),
                key: SectionKey::new("promo").unwrap(),
                component: "PromoCard".to_string(),
                label: "Promo".to_string(),
                content: None,
            },
            draft,
            Utc::now(),
        )
    }

    #[test]
    fn derive_covers_every_case() {
        let a = json!({"eyebrow": "A"});
        let b = json!({"eyebrow": "B"});
        assert_eq!(SectionStatus::derive(&a, None), SectionStatus::Draft);
        assert_eq!(SectionStatus::derive(&a, Some(&a)), SectionStatus::Published);
        assert_eq!(SectionStatus::derive(&a, Some(&b)), SectionStatus::Dirty);
    }

    #[test]
    fn derive_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(SectionStatus::derive(&a, Some(&b)), SectionStatus::Published);
    }

    #[test]
    fn provisioned_section_is_draft_at_revision_one() {
        let s = section(json!({}));
        assert_eq!(s.status, SectionStatus::Draft);
        assert_eq!(s.revision, 1);
        assert!(s.published_content.is_none());
    }

    #[test]
    fn edits_before_publish_stay_draft() {
        let s = section(json!({"eyebrow": "A"})).with_draft(json!({"eyebrow": "B"}), Utc::now());
        assert_eq!(s.status, SectionStatus::Draft);
        assert_eq!(s.revision, 2);
    }

    #[test]
    fn publish_then_edit_cycle() {
        let now = Utc::now();
        let published = section(json!({"eyebrow": "A"})).published(now);
        assert_eq!(published.status, SectionStatus::Published);
        assert_eq!(published.published_content, Some(published.draft_content.clone()));
        assert_eq!(published.published_at, Some(now));

        let dirty = published.with_draft(json!({"eyebrow": "B"}), now);
        assert_eq!(dirty.status, SectionStatus::Dirty);

        let back = dirty.with_draft(json!({"eyebrow": "A"}), now);
        assert_eq!(back.status, SectionStatus::Published);

        let republished = dirty.published(now);
        assert_eq!(republished.status, SectionStatus::Published);
        assert_eq!(republished.published_content, Some(json!({"eyebrow": "B"})));
    }

    #[test]
    fn with_draft_leaves_original_untouched() {
        let original = section(json!({"eyebrow": "A"}));
        let _next = original.with_draft(json!({"eyebrow": "B"}), Utc::now());
        assert_eq!(original.draft_content, json!({"eyebrow": "A"}));
        assert_eq!(original.revision, 1);
    }

    #[test]
    fn derived_status_fixes_stale_cache() {
        let mut s = section(json!({"eyebrow": "A"})).published(Utc::now());
        s.draft_content = json!({"eyebrow": "Z"});
        assert_eq!(s.status, SectionStatus::Published);
        assert_eq!(s.with_derived_status().status, SectionStatus::Dirty);
    }

    #[test]
    fn transition_records_digest_and_states() {
        let before = section(json!({"eyebrow": "A"}));
        let after = before.published(Utc::now());
        let t = after
            .transition_from(Some(&before), TransitionTrigger::Published)
            .unwrap();
        assert_eq!(t.from, Some(SectionStatus::Draft));
        assert_eq!(t.to, SectionStatus::Published);
        assert_eq!(t.revision, 2);
        assert_eq!(t.content_digest, content_digest(&json!({"eyebrow": "A"})).unwrap());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(SectionStatus::Dirty).unwrap(), json!("dirty"));
        assert_eq!(
            serde_json::to_value(TransitionTrigger::DraftEdited).unwrap(),
            json!("draft_edited")
        );
    }
}
