//! # Component Schema API
//!
//! Read-only access to the schema registry, plus normalization of arbitrary
//! content so that editing clients can build forms and fill defaults
//! without a section.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use pcms_schema::{lint, to_json_schema, ComponentDefinition, LintFinding};

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// A registered component and its top-level field keys.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentSummary {
    pub name: String,
    /// Field keys in schema order.
    pub fields: Vec<String>,
}

/// Full component description.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentDetail {
    pub name: String,
    /// Field tree in the YAML definition format.
    #[schema(value_type = Object)]
    pub definition: serde_json::Value,
    /// Draft 2020-12 JSON Schema with defaults and `x-field-kind` per field.
    #[schema(value_type = Object)]
    pub json_schema: serde_json::Value,
}

/// An advisory schema finding.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    /// JSON pointer to the offending value.
    pub instance_path: String,
    pub message: String,
}

impl From<LintFinding> for Finding {
    fn from(f: LintFinding) -> Self {
        Self {
            instance_path: f.instance_path,
            message: f.message,
        }
    }
}

/// Result of normalizing a content record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NormalizeResponse {
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
    /// Type mismatches left in the normalized record. Advisory only.
    pub findings: Vec<Finding>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/components", get(list_components))
        .route("/v1/components/{component}", get(get_component))
        .route("/v1/components/{component}/defaults", get(component_defaults))
        .route("/v1/components/{component}/normalize", post(normalize_content))
}

fn unknown_component(name: &str) -> AppError {
    AppError::NotFound(format!("unknown component \"{name}\""))
}

/// GET /v1/components: List registered components.
#[utoipa::path(
    get,
    path = "/v1/components",
    responses(
        (status = 200, description = "Registered components", body = Vec<ComponentSummary>),
    ),
    tag = "components"
)]
pub(crate) async fn list_components(State(state): State<AppState>) -> Json<Vec<ComponentSummary>> {
    let registry = state.registry();
    let summaries = registry
        .component_names()
        .into_iter()
        .map(|name| ComponentSummary {
            name: name.to_string(),
            fields: registry
                .field_keys(name)
                .into_iter()
                .map(String::from)
                .collect(),
        })
        .collect();
    Json(summaries)
}

/// GET /v1/components/{component}: Field schema and JSON Schema.
#[utoipa::path(
    get,
    path = "/v1/components/{component}",
    params(("component" = String, Path, description = "Component type name")),
    responses(
        (status = 200, description = "Component schema", body = ComponentDetail),
        (status = 404, description = "Unknown component", body = crate::error::ErrorBody),
    ),
    tag = "components"
)]
pub(crate) async fn get_component(
    State(state): State<AppState>,
    Path(component): Path<String>,
) -> Result<Json<ComponentDetail>, AppError> {
    let schema = state
        .registry()
        .get_schema(&component)
        .ok_or_else(|| unknown_component(&component))?;
    let definition = serde_json::to_value(ComponentDefinition::from_schema(&component, schema))
        .map_err(|e| AppError::Internal(format!("failed to encode definition: {e}")))?;
    Ok(Json(ComponentDetail {
        json_schema: to_json_schema(&component, schema),
        name: component,
        definition,
    }))
}

/// GET /v1/components/{component}/defaults: A fully defaulted record.
#[utoipa::path(
    get,
    path = "/v1/components/{component}/defaults",
    params(("component" = String, Path, description = "Component type name")),
    responses(
        (status = 200, description = "Default content record", body = Object),
        (status = 404, description = "Unknown component", body = crate::error::ErrorBody),
    ),
    tag = "components"
)]
pub(crate) async fn component_defaults(
    State(state): State<AppState>,
    Path(component): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.registry().contains(&component) {
        return Err(unknown_component(&component));
    }
    Ok(Json(
        state
            .sections
            .normalize(&component, serde_json::Value::Object(Default::default())),
    ))
}

/// POST /v1/components/{component}/normalize: Fill defaults into a record.
#[utoipa::path(
    post,
    path = "/v1/components/{component}/normalize",
    params(("component" = String, Path, description = "Component type name")),
    request_body(content = Object, description = "Existing content record"),
    responses(
        (status = 200, description = "Normalized record", body = NormalizeResponse),
        (status = 404, description = "Unknown component", body = crate::error::ErrorBody),
    ),
    tag = "components"
)]
pub(crate) async fn normalize_content(
    State(state): State<AppState>,
    Path(component): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<NormalizeResponse>, AppError> {
    if !state.registry().contains(&component) {
        return Err(unknown_component(&component));
    }
    let content = state.sections.normalize(&component, extract_json(body)?);
    let findings = lint(state.registry(), &component, &content)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .into_iter()
        .map(Finding::from)
        .collect();
    Ok(Json(NormalizeResponse { content, findings }))
}
