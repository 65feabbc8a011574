//! # Preview API
//!
//! Editors obtain a short-lived token for one section; the external
//! renderer presents it back to fetch that section's draft.
//!
//! The renderer calls the content endpoint with the query of the preview URL
//! it was handed (`page` slug, `section` key, `token`). The token resolves to
//! the section it was issued for; the slug and key must name that same
//! section.
//!
//! The content endpoint sits outside the bearer-auth middleware. Every way
//! a fetch can fail (missing or malformed parameters, unknown, expired, or
//! mis-scoped token, vanished section) yields the same 401 body; the reason
//! only reaches the log and the rejection counter.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use pcms_core::{OrgId, PageId, SectionId};
use pcms_preview::{SectionScope, SANDBOX_POLICY};

use crate::auth::{require_read, CallerIdentity};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::middleware::metrics::{PREVIEW_TOKENS_ISSUED_TOTAL, PREVIEW_TOKENS_REJECTED_TOTAL};
use crate::state::AppState;

/// Request for a preview token.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    pub org_id: Uuid,
    pub page_id: Uuid,
    pub section_id: Uuid,
}

/// A freshly issued preview token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueTokenResponse {
    /// Opaque token. Not retrievable again.
    pub token: String,
    /// First instant at which the token is rejected.
    pub expires_at: DateTime<Utc>,
    /// Renderer URL carrying page slug, section key, and token.
    pub preview_url: String,
    /// Sandbox attribute the embedding frame must carry.
    pub sandbox: String,
}

/// Query presented by the renderer: exactly the parameters of the preview
/// URL it was given.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewContentQuery {
    /// Page slug.
    pub page: Option<String>,
    /// Section key.
    pub section: Option<String>,
    /// Preview token.
    pub token: Option<String>,
}

/// Draft content served to the renderer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreviewContentResponse {
    pub section_id: Uuid,
    pub page_slug: String,
    pub key: String,
    pub component: String,
    pub label: String,
    pub revision: u64,
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/preview/tokens", post(issue_token))
}

/// Routes reachable without bearer credentials.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/v1/preview/content", get(preview_content))
}

/// POST /v1/preview/tokens: Issue a preview token for one section.
#[utoipa::path(
    post,
    path = "/v1/preview/tokens",
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = IssueTokenResponse),
        (status = 404, description = "No such section on that page", body = crate::error::ErrorBody),
    ),
    tag = "preview"
)]
pub(crate) async fn issue_token(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueTokenResponse>), AppError> {
    let req = extract_json(body)?;
    let scope = SectionScope {
        org_id: OrgId::from_uuid(req.org_id),
        page_id: PageId::from_uuid(req.page_id),
        section_id: SectionId::from_uuid(req.section_id),
    };
    let not_found = || AppError::NotFound(format!("section {} not found", scope.section_id));

    let section = state.sections.get(scope.section_id)?;
    if section.org_id != scope.org_id || section.page_id != scope.page_id {
        return Err(not_found());
    }
    require_read(&caller, section.org_id, not_found)?;

    let issued = state.tokens.issue(scope);
    metrics::counter!(PREVIEW_TOKENS_ISSUED_TOTAL).increment(1);
    let preview_url = state
        .renderer
        .preview_url(&section.page_slug, &section.key, &issued.token);

    Ok((
        StatusCode::CREATED,
        Json(IssueTokenResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            preview_url: preview_url.to_string(),
            sandbox: SANDBOX_POLICY.to_string(),
        }),
    ))
}

fn deny(reason: &'static str) -> AppError {
    metrics::counter!(PREVIEW_TOKENS_REJECTED_TOTAL, "reason" => reason).increment(1);
    AppError::preview_denied()
}

/// GET /v1/preview/content: Draft content for the renderer.
#[utoipa::path(
    get,
    path = "/v1/preview/content",
    params(PreviewContentQuery),
    responses(
        (status = 200, description = "Draft content", body = PreviewContentResponse),
        (status = 401, description = "Token missing, invalid, expired, or out of scope", body = crate::error::ErrorBody),
    ),
    tag = "preview"
)]
pub(crate) async fn preview_content(
    State(state): State<AppState>,
    query: Result<Query<PreviewContentQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Ok(Query(query)) = query else {
        tracing::warn!(reason = "malformed", "preview fetch rejected");
        return Err(deny("malformed"));
    };
    let (Some(page), Some(key), Some(token)) = (query.page, query.section, query.token) else {
        tracing::warn!(reason = "missing_parameter", "preview fetch rejected");
        return Err(deny("missing_parameter"));
    };

    let scope = state
        .tokens
        .resolve(&token)
        .map_err(|rejection| deny(rejection.as_str()))?;

    let Ok(section) = state.sections.get(scope.section_id) else {
        tracing::warn!(
            reason = "section_gone",
            section_id = %scope.section_id,
            "preview fetch rejected"
        );
        return Err(deny("section_gone"));
    };

    let current = SectionScope {
        org_id: section.org_id,
        page_id: section.page_id,
        section_id: section.id,
    };
    if let Err(rejection) = state.tokens.validate(&token, &current) {
        return Err(deny(rejection.as_str()));
    }
    if section.page_slug.as_str() != page || section.key.as_str() != key {
        tracing::warn!(
            reason = "scope_mismatch",
            section_id = %section.id,
            "preview fetch rejected: page slug or section key differs from token scope"
        );
        return Err(deny("scope_mismatch"));
    }

    let body = PreviewContentResponse {
        section_id: *section.id.as_uuid(),
        page_slug: section.page_slug.as_str().to_string(),
        key: section.key.as_str().to_string(),
        component: section.component,
        label: section.label,
        revision: section.revision,
        content: section.draft_content,
    };
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(body)))
}
