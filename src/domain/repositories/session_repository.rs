//! Repository trait for the identity provider's session table.

use crate::domain::entities::SessionRecord;
use crate::error::AppError;
use async_trait::async_trait;

/// Read-only access to durable sessions.
///
/// Rows are written by the external identity provider.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgSessionRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session whose token equals `session_id` and whose expiry is
    /// strictly after the current time.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SessionRecord))` for an active session
    /// - `Ok(None)` if the session is unknown or expired
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_active(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError>;
}
