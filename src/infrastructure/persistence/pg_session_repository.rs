//! PostgreSQL implementation of session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::SessionRecord;
use crate::domain::repositories::SessionRepository;
use crate::error::AppError;

/// Reads the identity provider's `session` table.
///
/// The expiry comparison happens in the database so that the store's clock is
/// the one that decides whether a session is still valid.
pub struct PgSessionRepository {
    pool: Arc<PgPool>,
}

impl PgSessionRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_active(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            r#"
            SELECT "userId", "expiresAt"
            FROM session
            WHERE token = $1
              AND "expiresAt" > CURRENT_TIMESTAMP
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|(user_id, expires_at)| SessionRecord {
            user_id,
            expires_at,
        }))
    }
}
