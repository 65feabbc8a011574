//! Section persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `sections` table.
//! Lifecycle rules are enforced by `pcms-state`; the table only guards the
//! revision so that concurrent writers cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use pcms_core::{PageSlug, SectionId, SectionKey};
use pcms_state::Section;

const COLUMNS: &str = "id, org_id, page_id, page_slug, key, component, label, draft_content, \
                       published_content, status, revision, published_at, created_at, updated_at";

fn revision_to_db(revision: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(revision).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Insert a newly provisioned section.
pub async fn insert(pool: &PgPool, section: &Section) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO sections ({COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
    ))
    .bind(section.id.as_uuid())
    .bind(section.org_id.as_uuid())
    .bind(section.page_id.as_uuid())
    .bind(section.page_slug.as_str())
    .bind(section.key.as_str())
    .bind(&section.component)
    .bind(&section.label)
    .bind(&section.draft_content)
    .bind(&section.published_content)
    .bind(section.status.as_str())
    .bind(revision_to_db(section.revision)?)
    .bind(section.published_at)
    .bind(section.created_at)
    .bind(section.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the mutable columns of a section if its stored revision is
/// still `expected_revision`.
///
/// Returns `false` when no row matched, i.e. the revision moved or the
/// section is gone.
pub async fn update(
    pool: &PgPool,
    expected_revision: u64,
    next: &Section,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sections
         SET draft_content = $1, published_content = $2, status = $3, revision = $4,
             published_at = $5, updated_at = $6
         WHERE id = $7 AND revision = $8",
    )
    .bind(&next.draft_content)
    .bind(&next.published_content)
    .bind(next.status.as_str())
    .bind(revision_to_db(next.revision)?)
    .bind(next.published_at)
    .bind(next.updated_at)
    .bind(next.id.as_uuid())
    .bind(revision_to_db(expected_revision)?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete a section. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: SectionId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sections WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load every section for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Section>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SectionRow>(&format!(
        "SELECT {COLUMNS} FROM sections ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SectionRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: Uuid,
    org_id: Uuid,
    page_id: Uuid,
    page_slug: String,
    key: String,
    component: String,
    label: String,
    draft_content: serde_json::Value,
    published_content: Option<serde_json::Value>,
    // Stored for querying only; re-derived on load.
    #[allow(dead_code)]
    status: String,
    revision: i64,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SectionRow {
    fn into_record(self) -> Result<Section, sqlx::Error> {
        let decode = |e: Box<dyn std::error::Error + Send + Sync>| sqlx::Error::Decode(e);
        let section = Section {
            id: SectionId::from_uuid(self.id),
            org_id: self.org_id.into(),
            page_id: self.page_id.into(),
            page_slug: PageSlug::new(self.page_slug).map_err(|e| decode(Box::new(e)))?,
            key: SectionKey::new(self.key).map_err(|e| decode(Box::new(e)))?,
            component: self.component,
            label: self.label,
            draft_content: self.draft_content,
            published_content: self.published_content,
            status: pcms_state::SectionStatus::Draft,
            revision: u64::try_from(self.revision).map_err(|e| decode(Box::new(e)))?,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok(section.with_derived_status())
    }
}
