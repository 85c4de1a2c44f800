//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::{InsertOutcome, LinkRepository};
use crate::error::AppError;

pub(crate) const SHORT_CODE_CONSTRAINT: &str = "short_links_short_code_key";
pub(crate) const OWNER_URL_CONSTRAINT: &str = "short_links_owner_url_key";

const COLUMNS: &str = "id, short_code, original_url, user_id, is_active, expires_at, created_at";

#[derive(FromRow)]
struct ShortLinkRow {
    id: i64,
    short_code: String,
    original_url: String,
    user_id: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(r: ShortLinkRow) -> Self {
        Self {
            id: r.id,
            short_code: r.short_code,
            original_url: r.original_url,
            user_id: r.user_id,
            is_active: r.is_active,
            expires_at: r.expires_at,
            created_at: r.created_at,
        }
    }
}

/// Name of the unique constraint a query violated, if any.
fn violated_constraint(e: &sqlx::Error) -> Option<&str> {
    let db = e.as_database_error()?;
    if db.is_unique_violation() {
        db.constraint()
    } else {
        None
    }
}

/// PostgreSQL repository for short links.
///
/// Code and (owner, URL) uniqueness are enforced by table constraints; the
/// repository translates their violations instead of checking first.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewShortLink) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "INSERT INTO short_links (short_code, original_url, user_id, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&new_link.short_code)
        .bind(&new_link.original_url)
        .bind(new_link.user_id)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(row.into())),
            Err(e) => match violated_constraint(&e) {
                Some(SHORT_CODE_CONSTRAINT) => Ok(InsertOutcome::CodeTaken),
                Some(OWNER_URL_CONSTRAINT) => Ok(InsertOutcome::DuplicateUrl),
                _ => Err(e.into()),
            },
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {COLUMNS} FROM short_links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {COLUMNS} FROM short_links WHERE short_code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_owner_and_url(
        &self,
        user_id: i64,
        original_url: &str,
    ) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {COLUMNS} FROM short_links WHERE user_id = $1 AND original_url = $2"
        ))
        .bind(user_id)
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_active_by_owner(&self, user_id: i64) -> Result<Vec<ShortLink>, AppError> {
        let rows = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {COLUMNS} FROM short_links
             WHERE user_id = $1 AND is_active
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(
        &self,
        id: i64,
        patch: ShortLinkPatch,
    ) -> Result<Option<ShortLink>, AppError> {
        let (set_expiry, expires_at) = match patch.expires_at {
            Some(value) => (true, value),
            None => (false, None),
        };

        let result = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "UPDATE short_links SET
                 original_url = COALESCE($2, original_url),
                 is_active    = COALESCE($3, is_active),
                 expires_at   = CASE WHEN $4 THEN $5 ELSE expires_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(patch.original_url)
        .bind(patch.is_active)
        .bind(set_expiry)
        .bind(expires_at)
        .fetch_optional(self.pool.as_ref())
        .await;

        match result {
            Ok(row) => Ok(row.map(Into::into)),
            Err(e) if violated_constraint(&e) == Some(OWNER_URL_CONSTRAINT) => {
                Err(AppError::conflict(
                    "You already have a short link for this URL",
                    json!({ "id": id }),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
