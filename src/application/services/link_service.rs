//! Link creation and cache-aside resolution.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::background::BackgroundTasks;
use crate::domain::cache_entry::{
    CachedLink, Decoded, LINK_CACHE_TTL_SECS, link_key, stats_key,
};
use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::slug::{generate_link_id, generate_row_id};

/// How many fresh identifiers are tried when a generated short ID collides.
const MAX_GENERATED_SLUG_ATTEMPTS: usize = 3;

fn record_resolution(outcome: &'static str) {
    metrics::counter!("link_resolutions_total", "outcome" => outcome).increment(1);
}

/// Service for creating and resolving short links.
///
/// Resolution reads the cache first and only falls back to the database on a
/// miss. Cache entries are never invalidated; a status change becomes visible
/// once the cached entry expires, bounded by the link cache TTL.
///
/// Cache writes and click counting are detached via [`BackgroundTasks`]; their
/// outcome never affects the result returned to the caller.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    tasks: BackgroundTasks,
    link_cache_ttl: u64,
}

impl<L: LinkRepository + ?Sized + 'static> LinkService<L> {
    /// Creates a new link service with the default 24h link cache TTL.
    pub fn new(
        link_repository: Arc<L>,
        cache: Arc<dyn CacheService>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            link_repository,
            cache,
            tasks,
            link_cache_ttl: LINK_CACHE_TTL_SECS,
        }
    }

    /// Overrides the TTL of `url<short_id>` entries.
    pub fn with_link_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.link_cache_ttl = ttl_seconds;
        self
    }

    /// Creates a short link owned by `user_id`.
    ///
    /// An empty `custom_slug` means "generate one": the short ID is the first
    /// six characters of a fresh UUID that also serves as the row ID. A custom
    /// slug is used verbatim with a separately generated row ID.
    ///
    /// The cache entry for the new link is written in the background.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `user_id` is missing or empty; the
    /// store is not touched in that case.
    ///
    /// Returns [`AppError::Conflict`] if the custom slug is taken, or if every
    /// generated short ID collided.
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn shorten_url(
        &self,
        target_url: &str,
        custom_slug: &str,
        user_id: Option<&str>,
    ) -> Result<Link, AppError> {
        let user_id = match user_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(AppError::bad_request(
                    "An owning user is required to create a link",
                    json!({ "field": "user_id" }),
                ));
            }
        };

        let link = if custom_slug.is_empty() {
            self.save_with_generated_slug(target_url, user_id).await?
        } else {
            let new_link = NewLink::active(
                generate_row_id(),
                custom_slug.to_string(),
                target_url.to_string(),
                user_id.to_string(),
            );

            self.link_repository
                .save(new_link)
                .await
                .map_err(|e| match e {
                    AppError::Conflict { .. } => AppError::conflict(
                        format!("The custom slug '{}' is already in use", custom_slug),
                        json!({ "short_id": custom_slug }),
                    ),
                    other => other,
                })?
        };

        info!(short_id = %link.short_id, user_id, "Link created");
        self.schedule_cache_write(&link);

        Ok(link)
    }

    /// Resolves a short ID to its target URL and counts the click.
    ///
    /// # Resolution Order
    ///
    /// 1. `url<short_id>` in the cache. A paused entry fails immediately; an
    ///    active one is returned without touching the database.
    /// 2. On a miss, an unreadable entry, or a cache error: the database.
    ///    A successful lookup repopulates the cache in the background.
    ///
    /// Every successful resolution schedules click counting in both the cache
    /// counter and the database.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty short ID.
    /// Returns [`AppError::NotFound`] if the database has no such link.
    /// Returns [`AppError::Paused`] if the link is paused.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn resolve_url(&self, short_id: &str) -> Result<String, AppError> {
        if short_id.is_empty() {
            return Err(AppError::bad_request(
                "Short ID is required",
                json!({ "field": "short_id" }),
            ));
        }

        let key = link_key(short_id);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match CachedLink::decode(&raw) {
                Decoded::Valid(cached) => {
                    if cached.status.is_paused() {
                        record_resolution("paused");
                        info!(short_id, source = "cache", "Blocked resolution of paused link");
                        return Err(paused(short_id));
                    }

                    record_resolution("cache_hit");
                    self.schedule_click(short_id);
                    return Ok(cached.target_url);
                }
                Decoded::Malformed => {
                    warn!(key = %key, "Ignoring malformed cache entry");
                }
            },
            Ok(None) => debug!("Cache MISS for {}", key),
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, falling back to database"),
        }

        let link = match self.link_repository.get_by_short_id(short_id).await {
            Ok(link) => link,
            Err(e) => {
                if matches!(e, AppError::NotFound { .. }) {
                    record_resolution("not_found");
                    info!(short_id, "Resolution of unknown short ID");
                }
                return Err(e);
            }
        };

        if link.is_paused() {
            record_resolution("paused");
            info!(short_id, source = "database", "Blocked resolution of paused link");
            return Err(paused(short_id));
        }

        record_resolution("cache_miss");
        self.schedule_cache_write(&link);
        self.schedule_click(short_id);

        Ok(link.target_url)
    }

    async fn save_with_generated_slug(
        &self,
        target_url: &str,
        user_id: &str,
    ) -> Result<Link, AppError> {
        let mut attempt = 1;
        loop {
            let (id, short_id) = generate_link_id();
            let new_link =
                NewLink::active(id, short_id, target_url.to_string(), user_id.to_string());

            match self.link_repository.save(new_link).await {
                Err(AppError::Conflict { details, .. }) if attempt < MAX_GENERATED_SLUG_ATTEMPTS => {
                    debug!(attempt, %details, "Generated short ID collided, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Writes the resolution entry for `link` without waiting for it.
    fn schedule_cache_write(&self, link: &Link) {
        let key = link_key(&link.short_id);
        let payload = match CachedLink::from_link(link).encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let cache = self.cache.clone();
        let ttl = self.link_cache_ttl;
        self.tasks.spawn("cache_link", key.clone(), async move {
            cache.set(&key, &payload, ttl).await?;
            Ok(())
        });
    }

    /// Counts a click in the cache counter and the database, independently.
    fn schedule_click(&self, short_id: &str) {
        let key = stats_key(short_id);
        let cache = self.cache.clone();
        self.tasks.spawn("click_counter", key.clone(), async move {
            cache.increment_counter(&key).await?;
            Ok(())
        });

        let owned = short_id.to_string();
        let repository = self.link_repository.clone();
        self.tasks.spawn("click_increment", owned.clone(), async move {
            repository.increment_clicks(&owned).await
        });
    }
}

fn paused(short_id: &str) -> AppError {
    AppError::paused("Link is paused", json!({ "short_id": short_id }))
}
