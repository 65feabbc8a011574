//! End-to-end lifecycle scenarios through the public API.

use std::sync::Arc;

use pcms_core::{OrgId, PageId, PageSlug, SectionKey};
use pcms_schema::{ListItemPolicy, NormalizeOptions, SchemaRegistry};
use pcms_state::{
    MemorySectionStore, NewSection, SectionLifecycle, SectionStatus, StoreError, TransitionTrigger,
};
use serde_json::json;

fn new_section(org_id: OrgId, page_id: PageId, key: &str, component: &str) -> NewSection {
    NewSection {
        org_id,
        page_id,
        page_slug: PageSlug::new("menus/dinner").unwrap(),
        key: SectionKey::new(key).unwrap(),
        component: component.to_string(),
        label: key.to_string(),
        content: None,
    }
}

#[test]
fn never_published_section_stays_draft_across_edits() {
    let lc = SectionLifecycle::new(MemorySectionStore::new(), Arc::new(SchemaRegistry::builtin()));
    let id = lc
        .provision(new_section(OrgId::new(), PageId::new(), "hero", "HeroBanner"))
        .unwrap()
        .section
        .id;
    for heading in ["One", "Two", "Three"] {
        let s = lc.update_draft(id, json!({"heading": heading})).unwrap().section;
        assert_eq!(s.status, SectionStatus::Draft);
        assert!(s.published_content.is_none());
    }
}

#[test]
fn full_cycle_records_transitions() {
    let lc = SectionLifecycle::new(MemorySectionStore::new(), Arc::new(SchemaRegistry::builtin()));
    let id = lc
        .provision(new_section(OrgId::new(), PageId::new(), "contact", "ContactBlock"))
        .unwrap()
        .section
        .id;

    let published = lc.publish(id).unwrap();
    let t = published.transition.unwrap();
    assert_eq!(t.trigger, TransitionTrigger::Published);
    assert_eq!((t.from, t.to), (Some(SectionStatus::Draft), SectionStatus::Published));

    let edited = lc
        .update_draft(id, json!({"address": {"city": "Porto"}}))
        .unwrap();
    assert_eq!(edited.section.status, SectionStatus::Dirty);
    assert_eq!(edited.section.draft_content["address"]["street"], json!(""));

    let republished = lc.publish(id).unwrap().section;
    assert_eq!(republished.status, SectionStatus::Published);
    assert_eq!(
        republished.published_content.as_ref().unwrap()["address"]["city"],
        json!("Porto")
    );
    assert_eq!(republished.revision, 4);
}

#[test]
fn page_listing_and_slot_uniqueness() {
    let lc = SectionLifecycle::new(MemorySectionStore::new(), Arc::new(SchemaRegistry::builtin()));
    let org = OrgId::new();
    let page = PageId::new();
    lc.provision(new_section(org, page, "hero", "HeroBanner")).unwrap();
    lc.provision(new_section(org, page, "promo", "PromoCard")).unwrap();

    let err = lc
        .provision(new_section(org, page, "promo", "PromoCard"))
        .unwrap_err();
    assert!(matches!(
        err,
        pcms_state::LifecycleError::Store(StoreError::DuplicateKey { .. })
    ));
    assert_eq!(lc.list_page(org, page).unwrap().len(), 2);
    assert!(lc.list_page(OrgId::new(), page).unwrap().is_empty());
}

#[test]
fn list_item_policy_applies_to_drafts() {
    let lc = SectionLifecycle::new(MemorySectionStore::new(), Arc::new(SchemaRegistry::builtin()))
        .with_normalize_options(NormalizeOptions {
            list_items: ListItemPolicy::NormalizeItems,
        });
    let id = lc
        .provision(new_section(OrgId::new(), PageId::new(), "gallery", "Gallery"))
        .unwrap()
        .section
        .id;
    let s = lc
        .update_draft(id, json!({"images": [{"src": "a.jpg"}]}))
        .unwrap()
        .section;
    assert_eq!(
        s.draft_content["images"],
        json!([{"src": "a.jpg", "alt": "", "caption": ""}])
    );
}

#[test]
fn unknown_component_content_round_trips() {
    let lc = SectionLifecycle::new(MemorySectionStore::new(), Arc::new(SchemaRegistry::builtin()));
    let mut new = new_section(OrgId::new(), PageId::new(), "legacy", "RetiredWidget");
    new.content = Some(json!({"anything": [1, null, {"deep": true}]}));
    let s = lc.provision(new).unwrap().section;
    assert_eq!(s.draft_content, json!({"anything": [1, null, {"deep": true}]}));
}
