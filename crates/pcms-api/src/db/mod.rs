//! # Database Persistence Layer
//!
//! Optional Postgres persistence for sections via SQLx.
//!
//! When `DATABASE_URL` is set every section mutation is written to the
//! `sections` table before it is committed in memory, and the in-memory
//! store is hydrated from the table on startup. When absent the API runs
//! in-memory only, which suits development and tests.

pub mod sections;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect and run migrations.
///
/// Returns `None` when no URL is configured.
pub async fn init_pool(url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = url else {
        tracing::warn!(
            "DATABASE_URL not set: running in-memory only. Sections will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Whether `err` is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
