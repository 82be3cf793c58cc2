//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Authoritative store for links and their click counts.
///
/// Implementations must enforce `short_id` uniqueness and surface violations as
/// [`AppError::Conflict`] rather than a generic failure.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Persists a new link and returns it with store-assigned fields filled in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short ID (or primary key) is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn save(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its public short ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this short ID.
    /// Returns [`AppError::Internal`] on database errors.
    async fn get_by_short_id(&self, short_id: &str) -> Result<Link, AppError>;

    /// Increments the authoritative click counter of a link by one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_clicks(&self, short_id: &str) -> Result<(), AppError>;

    /// Checks if the store is reachable.
    async fn health_check(&self) -> bool;
}
