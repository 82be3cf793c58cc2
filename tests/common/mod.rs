#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use zipway::application::background::{BackgroundFailure, BackgroundTasks};
use zipway::application::services::{LinkService, SessionValidator};
use zipway::domain::entities::{Link, LinkStatus, NewLink, SessionRecord};
use zipway::domain::repositories::{LinkRepository, SessionRepository};
use zipway::error::AppError;
use zipway::infrastructure::cache::{CacheService, MemoryCache};
use zipway::state::AppState;

pub const SHORT_URL_DOMAIN: &str = "https://sho.rt";

/// Link store kept in a map, with call counters.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<HashMap<String, Link>>,
    pub save_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub fail_increments: AtomicBool,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, short_id: &str, target_url: &str, status: LinkStatus) {
        let link = NewLink {
            id: format!("{short_id}-row"),
            short_id: short_id.to_string(),
            target_url: target_url.to_string(),
            user_id: "seed-user".to_string(),
            status,
        }
        .into_link(0, Utc::now());

        self.links
            .lock()
            .unwrap()
            .insert(short_id.to_string(), link);
    }

    pub fn set_status(&self, short_id: &str, status: LinkStatus) {
        if let Some(link) = self.links.lock().unwrap().get_mut(short_id) {
            link.status = status;
        }
    }

    pub fn clicks(&self, short_id: &str) -> i64 {
        self.links
            .lock()
            .unwrap()
            .get(short_id)
            .map_or(0, |link| link.clicks)
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn save(&self, new_link: NewLink) -> Result<Link, AppError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let mut links = self.links.lock().unwrap();
        if links.contains_key(&new_link.short_id) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "urls_shortId_key" }),
            ));
        }

        let link = new_link.into_link(0, Utc::now());
        links.insert(link.short_id.clone(), link.clone());
        Ok(link)
    }

    async fn get_by_short_id(&self, short_id: &str) -> Result<Link, AppError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        self.links
            .lock()
            .unwrap()
            .get(short_id)
            .cloned()
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "short_id": short_id }))
            })
    }

    async fn increment_clicks(&self, short_id: &str) -> Result<(), AppError> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(AppError::internal("Database error", json!({})));
        }

        if let Some(link) = self.links.lock().unwrap().get_mut(short_id) {
            link.clicks += 1;
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Session table kept in a map, with a lookup counter.
///
/// Expiry is evaluated on every lookup, like the SQL filter.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    pub find_calls: AtomicUsize,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session_id: &str, user_id: &str, expires_at: DateTime<Utc>) {
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            SessionRecord {
                user_id: user_id.to_string(),
                expires_at,
            },
        );
    }

    pub fn insert_active(&self, session_id: &str, user_id: &str) {
        self.insert(session_id, user_id, Utc::now() + Duration::hours(1));
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_active(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);

        let now = Utc::now();
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .filter(|record| record.is_active_at(now))
            .cloned())
    }
}

/// Everything a test needs to drive the services and inspect their effects.
pub struct TestContext {
    pub links: Arc<InMemoryLinkRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub cache: Arc<MemoryCache>,
    pub tasks: BackgroundTasks,
    pub failures: mpsc::Receiver<BackgroundFailure>,
}

impl TestContext {
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let (tasks, failures) = BackgroundTasks::new(100);
        Self {
            links: Arc::new(InMemoryLinkRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            cache: Arc::new(MemoryCache::new()),
            tasks,
            failures,
        }
    }

    pub fn link_service(&self) -> LinkService<InMemoryLinkRepository> {
        LinkService::new(self.links.clone(), self.cache.clone(), self.tasks.clone())
    }

    pub fn session_validator(&self) -> SessionValidator<InMemorySessionRepository> {
        SessionValidator::new(self.sessions.clone(), self.cache.clone(), self.tasks.clone())
    }

    pub fn state(&self) -> AppState {
        let links: Arc<dyn LinkRepository> = self.links.clone();
        let sessions: Arc<dyn SessionRepository> = self.sessions.clone();
        let cache: Arc<dyn CacheService> = self.cache.clone();

        AppState::new(links, sessions, cache, self.tasks.clone(), SHORT_URL_DOMAIN)
    }

    /// Waits for every detached cache write and click increment.
    pub async fn settle(&self) {
        self.tasks.wait_idle().await;
    }
}

/// Cookie header carrying `token` in the secure session cookie.
pub fn session_cookie(token: &str) -> String {
    format!("theme=dark; __Secure-better-auth.session_token={token}")
}
