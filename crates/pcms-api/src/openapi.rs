//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PCMS API",
        version = "0.1.0",
        description = "Page-section content service: component schemas, section drafts and publishing, and scoped preview tokens for an external renderer.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Components
        crate::routes::components::list_components,
        crate::routes::components::get_component,
        crate::routes::components::component_defaults,
        crate::routes::components::normalize_content,
        // Sections
        crate::routes::sections::list_page_sections,
        crate::routes::sections::create_section,
        crate::routes::sections::get_section,
        crate::routes::sections::update_draft,
        crate::routes::sections::publish_section,
        crate::routes::sections::delete_section,
        // Preview
        crate::routes::preview::issue_token,
        crate::routes::preview::preview_content,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::components::ComponentSummary,
        crate::routes::components::ComponentDetail,
        crate::routes::components::Finding,
        crate::routes::components::NormalizeResponse,
        crate::routes::sections::CreateSectionRequest,
        crate::routes::sections::UpdateDraftRequest,
        crate::routes::sections::SectionResponse,
        crate::routes::sections::TransitionResponse,
        crate::routes::sections::SectionMutationResponse,
        crate::routes::preview::IssueTokenRequest,
        crate::routes::preview::IssueTokenResponse,
        crate::routes::preview::PreviewContentResponse,
    )),
    tags(
        (name = "components", description = "Component schema registry"),
        (name = "sections", description = "Section drafts and publishing"),
        (name = "preview", description = "Preview tokens and renderer content"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
