//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkStatus, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Row shape of the `urls` table.
#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: String,
    short_id: String,
    target_url: String,
    status: String,
    created_at: DateTime<Utc>,
    clicks: i64,
    user_id: Option<String>,
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<LinkStatus>().map_err(|e| {
            AppError::internal(
                "Stored link has an invalid status",
                json!({ "short_id": row.short_id, "reason": e.to_string() }),
            )
        })?;

        Ok(Link {
            id: row.id,
            short_id: row.short_id,
            target_url: row.target_url,
            user_id: row.user_id,
            status,
            clicks: row.clicks,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Uniqueness of `"shortId"` is enforced by the table's unique index; a
/// violated insert surfaces as [`AppError::Conflict`].
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn save(&self, new_link: NewLink) -> Result<Link, AppError> {
        let (created_at, clicks) = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
            r#"
            INSERT INTO urls (id, "shortId", target_url, "userId", status, "createdAt", clicks)
            VALUES ($1, $2, $3, $4, $5, NOW(), 0)
            RETURNING "createdAt", clicks
            "#,
        )
        .bind(&new_link.id)
        .bind(&new_link.short_id)
        .bind(&new_link.target_url)
        .bind(&new_link.user_id)
        .bind(new_link.status.as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(new_link.into_link(clicks, created_at))
    }

    async fn get_by_short_id(&self, short_id: &str) -> Result<Link, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id,
                   "shortId" AS short_id,
                   target_url,
                   status,
                   "createdAt" AS created_at,
                   clicks,
                   "userId" AS user_id
            FROM urls
            WHERE "shortId" = $1
            LIMIT 1
            "#,
        )
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(AppError::not_found(
                "Short link not found",
                json!({ "short_id": short_id }),
            )),
        }
    }

    async fn increment_clicks(&self, short_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE urls
            SET clicks = clicks + 1
            WHERE "shortId" = $1
            "#,
        )
        .bind(short_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
