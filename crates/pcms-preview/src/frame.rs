//! # Renderer URL Contract
//!
//! The external renderer is addressed by a base URL plus three query
//! parameters: `page` (page slug), `section` (section key), and `token`. It
//! must only ever be embedded in a frame carrying [`SANDBOX_POLICY`], which
//! permits scripts and same-origin access and nothing else: no top-level
//! navigation, no popups, no form submission.

use url::Url;

use pcms_core::{PageSlug, SectionKey};

use crate::error::PreviewError;

/// Sandbox attribute for the preview frame.
pub const SANDBOX_POLICY: &str = "allow-scripts allow-same-origin";

/// Validated renderer base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererEndpoint(Url);

impl RendererEndpoint {
    /// Parse and validate a renderer base URL. Only `http` and `https` are
    /// accepted.
    pub fn parse(raw: &str) -> Result<Self, PreviewError> {
        let invalid = |reason: String| PreviewError::InvalidRendererUrl {
            url: raw.to_string(),
            reason,
        };
        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_string()));
        }
        Ok(Self(url))
    }

    /// The base URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Preview URL for one section with the given token.
    pub fn preview_url(&self, page_slug: &PageSlug, section_key: &SectionKey, token: &str) -> Url {
        preview_url(&self.0, page_slug, section_key, token)
    }
}

impl std::fmt::Display for RendererEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Append the preview parameters to `base`. Existing query parameters on
/// the base are kept.
pub fn preview_url(base: &Url, page_slug: &PageSlug, section_key: &SectionKey, token: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("page", page_slug.as_str())
        .append_pair("section", section_key.as_str())
        .append_pair("token", token);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug() -> PageSlug {
        PageSlug::new("menus/dinner").unwrap()
    }

    fn key() -> SectionKey {
        SectionKey::new("promo_1").unwrap()
    }

    #[test]
    fn appends_three_parameters() {
        let endpoint = RendererEndpoint::parse("https://site.example/preview").unwrap();
        let url = endpoint.preview_url(&slug(), &key(), "abc123");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "menus/dinner".to_string()),
                ("section".to_string(), "promo_1".to_string()),
                ("token".to_string(), "abc123".to_string()),
            ]
        );
        assert_eq!(url.path(), "/preview");
    }

    #[test]
    fn keeps_existing_query() {
        let endpoint = RendererEndpoint::parse("http://localhost:3000/preview?theme=dark").unwrap();
        let url = endpoint.preview_url(&slug(), &key(), "t");
        assert!(url.as_str().starts_with("http://localhost:3000/preview?theme=dark&page="));
    }

    #[test]
    fn rejects_non_http_schemes() {
        for raw in ["ftp://x/preview", "mailto:editor@example.com", "not a url"] {
            assert!(
                matches!(
                    RendererEndpoint::parse(raw),
                    Err(PreviewError::InvalidRendererUrl { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn sandbox_policy_is_scripts_and_same_origin_only() {
        let tokens: Vec<&str> = SANDBOX_POLICY.split_whitespace().collect();
        assert_eq!(tokens, vec!["allow-scripts", "allow-same-origin"]);
        assert!(!SANDBOX_POLICY.contains("allow-top-navigation"));
        assert!(!SANDBOX_POLICY.contains("allow-forms"));
        assert!(!SANDBOX_POLICY.contains("allow-popups"));
    }
}
