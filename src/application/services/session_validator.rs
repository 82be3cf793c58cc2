//! Session validation through a layered cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::application::background::BackgroundTasks;
use crate::domain::cache_entry::{
    CachedSession, Decoded, ProviderIdentity, session_cache_ttl, session_key,
};
use crate::domain::entities::session_id;
use crate::domain::repositories::SessionRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

fn record_validation(tier: &'static str) {
    metrics::counter!("session_validations_total", "tier" => tier).increment(1);
}

/// Resolves opaque session tokens to user IDs.
///
/// # Lookup Order
///
/// 1. `session:<sid>` - the entry this service writes itself
/// 2. `<sid>` - the identity provider's own session blob (optional)
/// 3. The durable session table, filtered to unexpired rows
///
/// Tiers 2 and 3 populate tier 1 in the background with a TTL that never
/// exceeds the remaining session lifetime. Tier-1 entries also carry the
/// session expiry and are checked against it on every read, so a stale or
/// foreign `session:<sid>` entry never validates an expired session.
pub struct SessionValidator<S: SessionRepository + ?Sized> {
    sessions: Arc<S>,
    cache: Arc<dyn CacheService>,
    tasks: BackgroundTasks,
    consult_provider_cache: bool,
}

impl<S: SessionRepository + ?Sized> SessionValidator<S> {
    pub fn new(sessions: Arc<S>, cache: Arc<dyn CacheService>, tasks: BackgroundTasks) -> Self {
        Self {
            sessions,
            cache,
            tasks,
            consult_provider_cache: true,
        }
    }

    /// Enables or disables the identity provider blob lookup (tier 2).
    pub fn with_provider_cache(mut self, enabled: bool) -> Self {
        self.consult_provider_cache = enabled;
        self
    }

    /// Returns the user ID owning `token`.
    ///
    /// Only the part of the token before the first `.` is used as the lookup
    /// key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty token.
    /// Returns [`AppError::Unauthorized`] if no tier knows an active session.
    pub async fn validate_session(&self, token: &str) -> Result<String, AppError> {
        if token.is_empty() {
            return Err(AppError::bad_request(
                "Session token is required",
                json!({ "field": "session_token" }),
            ));
        }

        let sid = session_id(token);

        if let Some(raw) = self.read_cache(&session_key(sid)).await {
            match CachedSession::decode(&raw) {
                Decoded::Valid(cached) if cached.is_active_at(Utc::now()) => {
                    record_validation("session_cache");
                    return Ok(cached.user_id);
                }
                Decoded::Valid(_) => debug!("Cached session has expired"),
                Decoded::Malformed => debug!("Ignoring unreadable session cache entry"),
            }
        }

        if self.consult_provider_cache {
            if let Some(raw) = self.read_cache(sid).await {
                match ProviderIdentity::decode(&raw) {
                    Decoded::Valid(identity) if identity.expires_at > Utc::now() => {
                        record_validation("provider_cache");
                        self.remember(sid, &identity.user_id, identity.expires_at);
                        return Ok(identity.user_id);
                    }
                    Decoded::Valid(_) => debug!("Provider session blob has expired"),
                    Decoded::Malformed => debug!("Ignoring unreadable provider session blob"),
                }
            }
        }

        match self.sessions.find_active(sid).await {
            Ok(Some(record)) => {
                record_validation("database");
                self.remember(sid, &record.user_id, record.expires_at);
                return Ok(record.user_id);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Session lookup failed"),
        }

        record_validation("rejected");
        Err(AppError::unauthorized(
            "Invalid or expired session",
            json!({ "reason": "session not found or expired" }),
        ))
    }

    async fn read_cache(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Session cache read failed");
                None
            }
        }
    }

    /// Writes the tier-1 entry unless the session is about to expire.
    fn remember(&self, sid: &str, user_id: &str, expires_at: DateTime<Utc>) {
        let Some(ttl) = session_cache_ttl(expires_at, Utc::now()) else {
            return;
        };

        let cached = CachedSession {
            user_id: user_id.to_string(),
            expires_at,
        };
        let value = match cached.encode() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to encode session cache entry");
                return;
            }
        };

        let key = session_key(sid);
        let cache = self.cache.clone();
        self.tasks.spawn("cache_session", key.clone(), async move {
            cache.set(&key, &value, ttl).await?;
            Ok(())
        });
    }
}
