//! # Section API
//!
//! Provisioning, draft editing, publishing, and removal of page sections.
//! Every draft is normalized against its component schema before it is
//! stored; status is always derived by the lifecycle, never sent by
//! clients.
//!
//! Callers only see sections of their own organization. A section owned by
//! another organization answers exactly like one that does not exist.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use pcms_core::{OrgId, PageId, PageSlug, SectionId, SectionKey};
use pcms_state::{Committed, NewSection, Section, SectionTransition};

use crate::auth::{require_edit, require_read, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

// ── DTOs ────────────────────────────────────────────────────────────────────

/// Request to provision a section on a page.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSectionRequest {
    /// Slug of the page, used in preview URLs (e.g. `menus/dinner`).
    pub page_slug: String,
    /// Slot name within the page.
    pub key: String,
    /// Component type name.
    pub component: String,
    /// Label shown to editors. Defaults to the key.
    #[serde(default)]
    pub label: Option<String>,
    /// Initial content; normalized before storage.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub content: Option<serde_json::Value>,
}

impl Validate for CreateSectionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.component.trim().is_empty() {
            return Err("component must be non-empty".to_string());
        }
        if self.label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err("label must be non-empty when given".to_string());
        }
        Ok(())
    }
}

/// Request to replace a section's draft.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDraftRequest {
    /// New draft content; normalized before storage.
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
}

/// A section as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SectionResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub page_id: Uuid,
    pub page_slug: String,
    pub key: String,
    pub component: String,
    pub label: String,
    #[schema(value_type = Object)]
    pub draft_content: serde_json::Value,
    #[schema(value_type = Option<Object>)]
    pub published_content: Option<serde_json::Value>,
    /// `draft`, `published`, or `dirty`.
    pub status: String,
    pub revision: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Section> for SectionResponse {
    fn from(s: Section) -> Self {
        Self {
            id: *s.id.as_uuid(),
            org_id: *s.org_id.as_uuid(),
            page_id: *s.page_id.as_uuid(),
            page_slug: s.page_slug.as_str().to_string(),
            key: s.key.as_str().to_string(),
            component: s.component,
            label: s.label,
            draft_content: s.draft_content,
            published_content: s.published_content,
            status: s.status.as_str().to_string(),
            revision: s.revision,
            published_at: s.published_at,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// A committed status change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionResponse {
    /// Status before the change; absent on provisioning.
    pub from: Option<String>,
    pub to: String,
    /// `provisioned`, `draft_edited`, or `published`.
    pub trigger: String,
    pub revision: u64,
    /// `sha256:<hex>` digest of the canonical draft content.
    pub content_digest: String,
    pub at: DateTime<Utc>,
}

impl From<SectionTransition> for TransitionResponse {
    fn from(t: SectionTransition) -> Self {
        Self {
            from: t.from.map(|s| s.as_str().to_string()),
            to: t.to.as_str().to_string(),
            trigger: t.trigger.to_string(),
            revision: t.revision,
            content_digest: t.content_digest.to_string(),
            at: t.at,
        }
    }
}

/// Result of a mutating section operation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SectionMutationResponse {
    pub section: SectionResponse,
    /// Absent when the operation changed nothing.
    pub transition: Option<TransitionResponse>,
}

impl From<Committed> for SectionMutationResponse {
    fn from(c: Committed) -> Self {
        Self {
            section: c.section.into(),
            transition: c.transition.map(Into::into),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/orgs/{org_id}/pages/{page_id}/sections",
            get(list_page_sections).post(create_section),
        )
        .route(
            "/v1/sections/{section_id}",
            get(get_section).delete(delete_section),
        )
        .route("/v1/sections/{section_id}/draft", put(update_draft))
        .route("/v1/sections/{section_id}/publish", post(publish_section))
}

fn section_not_found(id: SectionId) -> AppError {
    AppError::NotFound(format!("section {id} not found"))
}

fn page_not_found(page: PageId) -> AppError {
    AppError::NotFound(format!("page {page} not found"))
}

/// Fetch a section the caller may read.
fn visible_section(
    state: &AppState,
    caller: &CallerIdentity,
    id: SectionId,
) -> Result<Section, AppError> {
    let section = state.sections.get(id)?;
    require_read(caller, section.org_id, || section_not_found(id))?;
    Ok(section)
}

/// Fetch a section the caller may change.
fn editable_section(
    state: &AppState,
    caller: &CallerIdentity,
    id: SectionId,
) -> Result<Section, AppError> {
    let section = state.sections.get(id)?;
    require_edit(caller, section.org_id, || section_not_found(id))?;
    Ok(section)
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// GET /v1/orgs/{org_id}/pages/{page_id}/sections: List a page's sections.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/pages/{page_id}/sections",
    params(
        ("org_id" = Uuid, Path, description = "Organization"),
        ("page_id" = Uuid, Path, description = "Page"),
    ),
    responses(
        (status = 200, description = "Sections of the page", body = Vec<SectionResponse>),
    ),
    tag = "sections"
)]
pub(crate) async fn list_page_sections(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((org_id, page_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<SectionResponse>>, AppError> {
    let (org_id, page_id) = (OrgId::from_uuid(org_id), PageId::from_uuid(page_id));
    require_read(&caller, org_id, || page_not_found(page_id))?;
    let sections = state.sections.list_page(org_id, page_id)?;
    Ok(Json(sections.into_iter().map(Into::into).collect()))
}

/// POST /v1/orgs/{org_id}/pages/{page_id}/sections: Provision a section.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/pages/{page_id}/sections",
    params(
        ("org_id" = Uuid, Path, description = "Organization"),
        ("page_id" = Uuid, Path, description = "Page"),
    ),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section provisioned", body = SectionMutationResponse),
        (status = 409, description = "Slot already taken", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "sections"
)]
pub(crate) async fn create_section(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((org_id, page_id)): Path<(Uuid, Uuid)>,
    body: Result<Json<CreateSectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SectionMutationResponse>), AppError> {
    let (org_id, page_id) = (OrgId::from_uuid(org_id), PageId::from_uuid(page_id));
    require_edit(&caller, org_id, || page_not_found(page_id))?;

    let req = extract_validated_json(body)?;
    if !state.registry().contains(&req.component) {
        return Err(AppError::Validation(format!(
            "unknown component \"{}\"",
            req.component
        )));
    }
    let key = SectionKey::new(req.key)?;
    let new = NewSection {
        org_id,
        page_id,
        page_slug: PageSlug::new(req.page_slug)?,
        label: req.label.unwrap_or_else(|| key.as_str().to_string()),
        key,
        component: req.component,
        content: req.content,
    };

    let committed = state.provision(new).await?;
    Ok((StatusCode::CREATED, Json(committed.into())))
}

/// GET /v1/sections/{section_id}: Read a section.
#[utoipa::path(
    get,
    path = "/v1/sections/{section_id}",
    params(("section_id" = Uuid, Path, description = "Section")),
    responses(
        (status = 200, description = "The section", body = SectionResponse),
        (status = 404, description = "No such section", body = crate::error::ErrorBody),
    ),
    tag = "sections"
)]
pub(crate) async fn get_section(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(section_id): Path<Uuid>,
) -> Result<Json<SectionResponse>, AppError> {
    let section = visible_section(&state, &caller, SectionId::from_uuid(section_id))?;
    Ok(Json(section.into()))
}

/// PUT /v1/sections/{section_id}/draft: Replace the draft.
#[utoipa::path(
    put,
    path = "/v1/sections/{section_id}/draft",
    params(("section_id" = Uuid, Path, description = "Section")),
    request_body = UpdateDraftRequest,
    responses(
        (status = 200, description = "Draft stored (normalized)", body = SectionMutationResponse),
        (status = 404, description = "No such section", body = crate::error::ErrorBody),
        (status = 409, description = "Concurrent modification", body = crate::error::ErrorBody),
    ),
    tag = "sections"
)]
pub(crate) async fn update_draft(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(section_id): Path<Uuid>,
    body: Result<Json<UpdateDraftRequest>, JsonRejection>,
) -> Result<Json<SectionMutationResponse>, AppError> {
    let id = SectionId::from_uuid(section_id);
    editable_section(&state, &caller, id)?;
    let req = extract_json(body)?;
    let committed = state.update_draft(id, req.content).await?;
    Ok(Json(committed.into()))
}

/// POST /v1/sections/{section_id}/publish: Publish the draft.
#[utoipa::path(
    post,
    path = "/v1/sections/{section_id}/publish",
    params(("section_id" = Uuid, Path, description = "Section")),
    responses(
        (status = 200, description = "Section published", body = SectionMutationResponse),
        (status = 404, description = "No such section", body = crate::error::ErrorBody),
        (status = 409, description = "Concurrent modification", body = crate::error::ErrorBody),
    ),
    tag = "sections"
)]
pub(crate) async fn publish_section(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(section_id): Path<Uuid>,
) -> Result<Json<SectionMutationResponse>, AppError> {
    let id = SectionId::from_uuid(section_id);
    editable_section(&state, &caller, id)?;
    let committed = state.publish(id).await?;
    Ok(Json(committed.into()))
}

/// DELETE /v1/sections/{section_id}: Remove a section.
#[utoipa::path(
    delete,
    path = "/v1/sections/{section_id}",
    params(("section_id" = Uuid, Path, description = "Section")),
    responses(
        (status = 204, description = "Section removed"),
        (status = 404, description = "No such section", body = crate::error::ErrorBody),
    ),
    tag = "sections"
)]
pub(crate) async fn delete_section(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(section_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let id = SectionId::from_uuid(section_id);
    editable_section(&state, &caller, id)?;
    state.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
