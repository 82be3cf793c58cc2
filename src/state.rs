//! Shared application state injected into handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use crate::application::background::BackgroundTasks;
use crate::application::services::{LinkService, SessionValidator};
use crate::domain::repositories::{LinkRepository, SessionRepository};
use crate::infrastructure::cache::CacheService;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub session_validator: Arc<SessionValidator<dyn SessionRepository>>,
    /// Used by the health endpoint only; services hold their own handles.
    pub link_repository: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub tasks: BackgroundTasks,
    /// Prefix of every `short_url` returned to clients, without trailing slash.
    pub short_url_domain: String,
    pub started_at: Instant,
}

impl AppState {
    /// Wires services around the given ports with default service settings.
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        session_repository: Arc<dyn SessionRepository>,
        cache: Arc<dyn CacheService>,
        tasks: BackgroundTasks,
        short_url_domain: impl Into<String>,
    ) -> Self {
        let link_service = LinkService::new(link_repository.clone(), cache.clone(), tasks.clone());
        let session_validator =
            SessionValidator::new(session_repository, cache.clone(), tasks.clone());

        Self {
            link_service: Arc::new(link_service),
            session_validator: Arc::new(session_validator),
            link_repository,
            cache,
            tasks,
            short_url_domain: short_url_domain.into(),
            started_at: Instant::now(),
        }
    }

    /// Builds the public short URL for `short_id`.
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.short_url_domain.trim_end_matches('/'), short_id)
    }
}
