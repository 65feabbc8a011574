//! # Application State & Configuration
//!
//! [`AppConfig`] is read once from the environment at startup. [`AppState`]
//! is cloned into every handler and holds the section lifecycle, the
//! preview token registry, and the optional Postgres pool.
//!
//! ## Write-through
//!
//! With a database configured, every mutation is planned against the
//! in-memory store, written to Postgres with a single revision-guarded
//! statement, and only then committed to memory. A lost race in either
//! place re-plans from the latest in-memory state.

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use thiserror::Error;

use pcms_core::SectionId;
use pcms_preview::{PreviewError, PreviewTokenService, RendererEndpoint, DEFAULT_TOKEN_TTL_SECS};
use pcms_schema::{ListItemPolicy, NormalizeOptions, SchemaDefinitionError, SchemaRegistry};
use pcms_state::{
    Committed, LifecycleError, MemorySectionStore, NewSection, PendingCommit, Section,
    SectionLifecycle, TransitionTrigger, DEFAULT_MAX_RETRIES,
};

use crate::db;
use crate::error::AppError;

/// Section lifecycle as used by the API.
pub type Lifecycle = SectionLifecycle<MemorySectionStore>;

/// Default renderer base URL.
pub const DEFAULT_RENDERER_URL: &str = "http://localhost:3000/preview";

// ── Configuration ───────────────────────────────────────────────────────────

/// Errors raised while building the application state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid value for {var}: \"{value}\" ({reason})")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Renderer(#[from] PreviewError),

    #[error(transparent)]
    ComponentDefinitions(#[from] SchemaDefinitionError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to hydrate sections: {0}")]
    Hydration(#[from] LifecycleError),
}

/// Runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Static bearer secret. `None` disables authentication.
    pub auth_token: Option<String>,
    /// Postgres URL. `None` keeps everything in memory.
    pub database_url: Option<String>,
    pub renderer_url: String,
    pub preview_token_ttl_secs: u32,
    /// Directory of YAML component definitions loaded over the built-ins.
    pub component_dir: Option<PathBuf>,
    pub list_item_policy: ListItemPolicy,
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("renderer_url", &self.renderer_url)
            .field("preview_token_ttl_secs", &self.preview_token_ttl_secs)
            .field("component_dir", &self.component_dir)
            .field("list_item_policy", &self.list_item_policy)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            database_url: None,
            renderer_url: DEFAULT_RENDERER_URL.to_string(),
            preview_token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            component_dir: None,
            list_item_policy: ListItemPolicy::default(),
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StartupError> {
        let defaults = Self::default();
        let set = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match set("PORT") {
            Some(raw) => parse_env("PORT", raw)?,
            None => defaults.port,
        };
        let preview_token_ttl_secs = match set("PCMS_PREVIEW_TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs: u32 = parse_env("PCMS_PREVIEW_TOKEN_TTL_SECS", raw.clone())?;
                if secs == 0 {
                    return Err(StartupError::InvalidEnv {
                        var: "PCMS_PREVIEW_TOKEN_TTL_SECS",
                        value: raw,
                        reason: "must be positive".to_string(),
                    });
                }
                secs
            }
            None => defaults.preview_token_ttl_secs,
        };
        let list_item_policy = match set("PCMS_LIST_ITEM_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|reason| StartupError::InvalidEnv {
                    var: "PCMS_LIST_ITEM_POLICY",
                    value: raw,
                    reason,
                })?,
            None => defaults.list_item_policy,
        };

        Ok(Self {
            port,
            auth_token: set("AUTH_TOKEN"),
            database_url: set("DATABASE_URL"),
            renderer_url: set("PCMS_RENDERER_URL").unwrap_or(defaults.renderer_url),
            preview_token_ttl_secs,
            component_dir: set("PCMS_COMPONENT_DIR").map(PathBuf::from),
            list_item_policy,
            metrics_enabled: set("PCMS_METRICS_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.metrics_enabled),
        })
    }
}

fn parse_env<T>(var: &'static str, raw: String) -> Result<T, StartupError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| StartupError::InvalidEnv {
        var,
        reason: e.to_string(),
        value: raw,
    })
}

// ── State ───────────────────────────────────────────────────────────────────

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sections: Arc<Lifecycle>,
    pub tokens: Arc<PreviewTokenService>,
    pub renderer: RendererEndpoint,
    pub db_pool: Option<PgPool>,
    /// Prometheus exporter handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("components", &self.sections.registry().len())
            .field("sections", &self.sections.store().len())
            .field("db_pool", &self.db_pool.is_some())
            .finish()
    }
}

impl AppState {
    /// Build in-memory state: schema registry (built-ins plus any YAML
    /// definitions), lifecycle, token registry, and renderer endpoint.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let mut registry = SchemaRegistry::builtin();
        if let Some(dir) = &config.component_dir {
            let loaded = registry.load_dir(dir)?;
            tracing::info!(dir = %dir.display(), loaded, "component definitions loaded");
        }

        let options = NormalizeOptions {
            list_items: config.list_item_policy,
        };
        let sections = SectionLifecycle::new(MemorySectionStore::new(), Arc::new(registry))
            .with_normalize_options(options);
        let ttl = chrono::Duration::seconds(i64::from(config.preview_token_ttl_secs));
        let renderer = RendererEndpoint::parse(&config.renderer_url)?;

        Ok(Self {
            config: Arc::new(config),
            sections: Arc::new(sections),
            tokens: Arc::new(PreviewTokenService::new(ttl)),
            renderer,
            db_pool: None,
            metrics: None,
        })
    }

    /// Attach a Postgres pool for write-through persistence.
    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }

    /// Attach the Prometheus exporter handle served at `/metrics`.
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// The component registry.
    pub fn registry(&self) -> &SchemaRegistry {
        self.sections.registry()
    }

    /// Load every persisted section into memory, re-deriving status.
    pub async fn hydrate_from_db(&self) -> Result<usize, StartupError> {
        let Some(pool) = &self.db_pool else {
            return Ok(0);
        };
        let sections = db::sections::load_all(pool).await?;
        let count = sections.len();
        for section in sections {
            self.sections.insert(section)?;
        }
        tracing::info!(sections = count, "hydrated sections from database");
        Ok(count)
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Provision a new section.
    pub async fn provision(&self, new: NewSection) -> Result<Committed, AppError> {
        let (section, transition) = self.sections.plan_provision(new)?;

        if let Some(pool) = &self.db_pool {
            if let Err(e) = db::sections::insert(pool, &section).await {
                if db::is_unique_violation(&e) {
                    return Err(AppError::Conflict(format!(
                        "page {} already has a section with key \"{}\"",
                        section.page_id, section.key
                    )));
                }
                return Err(e.into());
            }
        }

        self.sections.insert(section.clone())?;
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

    /// Replace a section's draft with normalized `content`.
    pub async fn update_draft(
        &self,
        id: SectionId,
        content: serde_json::Value,
    ) -> Result<Committed, AppError> {
        self.apply(id, |lifecycle| lifecycle.plan_draft_update(id, content.clone()))
            .await
    }

    /// Publish a section's draft.
    pub async fn publish(&self, id: SectionId) -> Result<Committed, AppError> {
        let committed = self.apply(id, |lifecycle| lifecycle.plan_publish(id)).await?;
        if committed
            .transition
            .as_ref()
            .is_some_and(|t| t.trigger == TransitionTrigger::Published)
        {
            metrics::counter!("pcms_section_publishes_total").increment(1);
        }
        Ok(committed)
    }

    /// Remove a section.
    pub async fn remove(&self, id: SectionId) -> Result<Section, AppError> {
        if let Some(pool) = &self.db_pool {
            db::sections::delete(pool, id).await?;
        }
        Ok(self.sections.remove(id)?)
    }

    async fn apply(
        &self,
        id: SectionId,
        plan: impl Fn(&Lifecycle) -> Result<PendingCommit, LifecycleError>,
    ) -> Result<Committed, AppError> {
        let mut conflicts = 0;
        loop {
            let pending = plan(&self.sections)?;

            let mut persisted = false;
            if let (Some(pool), false) = (&self.db_pool, pending.is_noop()) {
                if !db::sections::update(pool, pending.expected_revision(), pending.next()).await? {
                    if conflicts < DEFAULT_MAX_RETRIES {
                        conflicts += 1;
                        tracing::debug!(section_id = %id, attempt = conflicts, "database revision conflict, re-planning");
                        tokio::task::yield_now().await;
                        continue;
                    }
                    return Err(AppError::Conflict(format!(
                        "section {id} is being modified concurrently"
                    )));
                }
                persisted = true;
            }

            match self.sections.commit(pending) {
                Ok(committed) => return Ok(committed),
                Err(e) if persisted => {
                    tracing::error!(section_id = %id, error = %e, "section persisted but in-memory commit failed");
                    return Err(AppError::Internal(format!(
                        "section {id} persisted but not committed in memory: {e}"
                    )));
                }
                Err(e) if e.is_conflict() && conflicts < DEFAULT_MAX_RETRIES => {
                    conflicts += 1;
                    tracing::debug!(section_id = %id, attempt = conflicts, "revision conflict, re-planning");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
