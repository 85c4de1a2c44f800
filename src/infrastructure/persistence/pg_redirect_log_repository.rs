//! PostgreSQL implementation of the redirect log repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{GroupCount, LinkAnalytics, NewRedirectLog, RedirectLog};
use crate::domain::repositories::RedirectLogRepository;
use crate::error::AppError;

#[derive(FromRow)]
struct RedirectLogRow {
    id: i64,
    short_link_id: i64,
    ip_hash: String,
    country: String,
    browser: String,
    device: String,
    created_at: DateTime<Utc>,
}

impl From<RedirectLogRow> for RedirectLog {
    fn from(r: RedirectLogRow) -> Self {
        Self {
            id: r.id,
            short_link_id: r.short_link_id,
            ip_hash: r.ip_hash,
            country: r.country,
            browser: r.browser,
            device: r.device,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct GroupRow {
    key: String,
    count: i64,
}

/// Grouping columns. Interpolated into SQL, so only these fixed names are used.
#[derive(Clone, Copy)]
enum GroupBy {
    Country,
    Browser,
    Device,
}

impl GroupBy {
    fn column(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Browser => "browser",
            Self::Device => "device",
        }
    }
}

/// PostgreSQL repository for the append-only redirect log.
///
/// Analytics run their four aggregate queries in one `REPEATABLE READ`
/// transaction so the total and every grouping see the same snapshot.
pub struct PgRedirectLogRepository {
    pool: Arc<PgPool>,
}

impl PgRedirectLogRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn grouped(
        tx: &mut Transaction<'_, Postgres>,
        short_link_id: i64,
        group_by: GroupBy,
    ) -> Result<Vec<GroupCount>, AppError> {
        let column = group_by.column();
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {column} AS key, COUNT(*) AS count
             FROM redirect_logs
             WHERE short_link_id = $1
             GROUP BY {column}
             ORDER BY count DESC, key ASC"
        ))
        .bind(short_link_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| GroupCount::new(r.key, r.count))
            .collect())
    }
}

#[async_trait]
impl RedirectLogRepository for PgRedirectLogRepository {
    async fn append(&self, new_log: NewRedirectLog) -> Result<RedirectLog, AppError> {
        let result = sqlx::query_as::<_, RedirectLogRow>(
            r#"
            INSERT INTO redirect_logs (short_link_id, ip_hash, country, browser, device)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, short_link_id, ip_hash, country, browser, device, created_at
            "#,
        )
        .bind(new_log.short_link_id)
        .bind(&new_log.ip_hash)
        .bind(&new_log.country)
        .bind(&new_log.browser)
        .bind(&new_log.device)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(e)
                if e
                    .as_database_error()
                    .is_some_and(|db| db.is_foreign_key_violation()) =>
            {
                Err(AppError::bad_request(
                    "Short link does not exist",
                    json!({ "short_link_id": new_log.short_link_id }),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn summarize(&self, short_link_id: i64) -> Result<LinkAnalytics, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total_clicks: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM redirect_logs WHERE short_link_id = $1")
                .bind(short_link_id)
                .fetch_one(&mut *tx)
                .await?;

        let by_country = Self::grouped(&mut tx, short_link_id, GroupBy::Country).await?;
        let by_browser = Self::grouped(&mut tx, short_link_id, GroupBy::Browser).await?;
        let by_device = Self::grouped(&mut tx, short_link_id, GroupBy::Device).await?;

        tx.commit().await?;

        Ok(LinkAnalytics {
            total_clicks,
            by_country,
            by_browser,
            by_device,
        })
    }
}
