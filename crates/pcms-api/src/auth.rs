//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with role-based access control.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{org_id}:{secret}   scoped to one organization
//! Bearer {secret}                   legacy, treated as platform admin
//! ```
//!
//! Every authenticated request gets a [`CallerIdentity`] in its extensions;
//! handlers take it as an extractor. The preview content endpoint does not
//! pass through this middleware: the renderer authenticates with a preview
//! token instead.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use pcms_core::OrgId;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── Role ────────────────────────────────────────────────────────────────────

/// Caller roles, ordered by privilege: `Viewer < Editor < PlatformAdmin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can read sections and preview drafts of its own organization.
    Viewer,
    /// Can also provision, edit, publish, and remove sections of its own
    /// organization.
    Editor,
    /// Full access across organizations.
    PlatformAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::PlatformAdmin => "platform_admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
    /// Organization the caller acts for. `None` only for platform admins.
    pub org_id: Option<OrgId>,
}

impl CallerIdentity {
    /// A caller with unrestricted access.
    pub fn platform_admin() -> Self {
        Self {
            role: Role::PlatformAdmin,
            org_id: None,
        }
    }

    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    /// Whether the caller may see content belonging to `org`.
    pub fn can_read(&self, org: OrgId) -> bool {
        self.role == Role::PlatformAdmin || self.org_id == Some(org)
    }

    /// Whether the caller may change content belonging to `org`.
    pub fn can_edit(&self, org: OrgId) -> bool {
        self.can_read(org) && self.has_role(Role::Editor)
    }
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role (403 otherwise).
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

/// Check read access to an organization's section. Callers outside the
/// organization get the same 404 as for a section that does not exist.
pub fn require_read(
    caller: &CallerIdentity,
    org: OrgId,
    not_found: impl FnOnce() -> AppError,
) -> Result<(), AppError> {
    if caller.can_read(org) {
        Ok(())
    } else {
        Err(not_found())
    }
}

/// Check edit access: 404 outside the organization, 403 for viewers in it.
pub fn require_edit(
    caller: &CallerIdentity,
    org: OrgId,
    not_found: impl FnOnce() -> AppError,
) -> Result<(), AppError> {
    require_read(caller, org, not_found)?;
    require_role(caller, Role::Editor)
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{role}:{org_id}:{secret}` or `{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.as_slice() {
        [secret] => {
            if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity::platform_admin())
            } else {
                Err("invalid bearer token".into())
            }
        }
        [role, org, secret] => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let role = match *role {
                "platform_admin" => Role::PlatformAdmin,
                "editor" => Role::Editor,
                "viewer" => Role::Viewer,
                other => return Err(format!("unknown role: {other}")),
            };

            let org_id = if org.is_empty() {
                None
            } else {
                Some(org.parse::<OrgId>().map_err(|e| e.to_string())?)
            };

            if org_id.is_none() && role != Role::PlatformAdmin {
                return Err(format!("role '{}' requires an organization", role.as_str()));
            }

            Ok(CallerIdentity { role, org_id })
        }
        _ => Err("invalid token format: expected {role}:{org_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the Bearer token and inject the caller's identity.
///
/// When `AuthConfig.token` is `None` every request is allowed as platform
/// admin (development mode).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header.map(|h| h.strip_prefix("Bearer ")) {
                Some(Some(provided)) => match parse_bearer_token(provided, expected) {
                    Ok(identity) => {
                        request.extensions_mut().insert(identity);
                        next.run(request).await
                    }
                    Err(msg) => {
                        tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                        unauthorized_response(&msg)
                    }
                },
                Some(None) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request
                .extensions_mut()
                .insert(CallerIdentity::platform_admin());
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(token: Option<String>) -> Router {
        Router::new()
            .route(
                "/test",
                get(|caller: CallerIdentity| async move { caller.role.as_str() }),
            )
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { token }))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn legacy_secret_is_platform_admin() {
        let (status, body) = call(test_app(Some("s3cret".into())), Some("Bearer s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "platform_admin");
    }

    #[tokio::test]
    async fn scoped_token_carries_role() {
        let org = OrgId::new();
        let header = format!("Bearer editor:{org}:s3cret");
        let (status, body) = call(test_app(Some("s3cret".into())), Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "editor");
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let (status, body) = call(test_app(Some("s3cret".into())), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing authorization header"));
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let (status, _) = call(test_app(Some("s3cret".into())), Some("Bearer nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn basic_scheme_rejected() {
        let (status, body) =
            call(test_app(Some("s3cret".into())), Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Bearer scheme"));
    }

    #[tokio::test]
    async fn auth_disabled_allows_all() {
        let (status, body) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "platform_admin");
    }

    #[test]
    fn viewer_needs_an_org() {
        assert!(parse_bearer_token("viewer::s3cret", "s3cret").is_err());
        assert!(parse_bearer_token("platform_admin::s3cret", "s3cret").is_ok());
    }

    #[test]
    fn unknown_role_and_bad_org_rejected() {
        let org = OrgId::new();
        assert!(parse_bearer_token(&format!("owner:{org}:s3cret"), "s3cret").is_err());
        assert!(parse_bearer_token("editor:not-a-uuid:s3cret", "s3cret").is_err());
    }

    #[test]
    fn wrong_secret_rejected_before_role_parsing() {
        let err = parse_bearer_token("owner:x:wrong", "s3cret").unwrap_err();
        assert_eq!(err, "invalid bearer token");
    }

    #[test]
    fn access_rules() {
        let org = OrgId::new();
        let other = OrgId::new();
        let viewer = CallerIdentity {
            role: Role::Viewer,
            org_id: Some(org),
        };
        let editor = CallerIdentity {
            role: Role::Editor,
            org_id: Some(org),
        };
        let admin = CallerIdentity::platform_admin();

        assert!(viewer.can_read(org));
        assert!(!viewer.can_edit(org));
        assert!(editor.can_edit(org));
        assert!(!editor.can_read(other));
        assert!(admin.can_edit(other));

        let not_found = || AppError::NotFound("section".into());
        assert!(matches!(
            require_edit(&viewer, org, not_found),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            require_edit(&editor, other, not_found),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::PlatformAdmin);
    }

    #[test]
    fn constant_time_eq_rejects_prefix() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("ab", "abc"));
        assert!(!constant_time_token_eq("", "abc"));
    }

    #[test]
    fn debug_redacts_token() {
        let config = AuthConfig {
            token: Some("s3cret".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("REDACTED"));
    }
}
