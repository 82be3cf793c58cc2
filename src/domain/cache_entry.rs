//! Cache key layout and cached payload formats.
//!
//! Every cache entry is derived data: it can be rebuilt from the database and
//! may disappear at any time.
//!
//! | key                 | value                          | TTL                  |
//! |---------------------|--------------------------------|----------------------|
//! | `url<short_id>`     | JSON `{target_url, status}`    | link TTL (24h)       |
//! | `session:<id>`      | JSON `{user_id, expires_at}`   | ≤ 60s, ≤ session life|
//! | `<id>`              | identity provider session JSON | provider controlled  |
//! | `stats:<short_id>`  | integer click counter          | none                 |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Link, LinkStatus};

/// Default TTL of a resolution entry.
pub const LINK_CACHE_TTL_SECS: u64 = 86_400;

/// Upper bound on the TTL of a tier-1 session entry.
///
/// The shorter of the known variants; entries are further clamped to the
/// remaining lifetime of the session they describe.
pub const SESSION_CACHE_TTL_SECS: u64 = 60;

pub fn link_key(short_id: &str) -> String {
    format!("url{short_id}")
}

pub fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

pub fn stats_key(short_id: &str) -> String {
    format!("stats:{short_id}")
}

/// Resolution fast-path payload stored under [`link_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachedLink {
    pub target_url: String,
    pub status: LinkStatus,
}

/// Outcome of decoding a raw cache value.
///
/// A malformed value is never an error: callers treat it as a miss.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Valid(T),
    Malformed,
}

impl CachedLink {
    pub fn from_link(link: &Link) -> Self {
        Self {
            target_url: link.target_url.clone(),
            status: link.status,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Decoded<Self> {
        match serde_json::from_str(raw) {
            Ok(cached) => Decoded::Valid(cached),
            Err(_) => Decoded::Malformed,
        }
    }
}

/// Tier-1 session payload stored under [`session_key`].
///
/// The session expiry travels with the user ID so a reader can reject the
/// entry once the session is over, whatever TTL the entry was written with.
/// Bare user IDs left by other writers decode as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachedSession {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedSession {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Decoded<Self> {
        match serde_json::from_str::<Self>(raw) {
            Ok(cached) if !cached.user_id.is_empty() => Decoded::Valid(cached),
            _ => Decoded::Malformed,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Session blob written by the identity provider under the bare session ID.
#[derive(Debug, Deserialize)]
struct ProviderSessionBlob {
    session: ProviderSession,
    #[serde(default)]
    user: Option<ProviderUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSession {
    #[serde(default)]
    user_id: Option<String>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    #[serde(default)]
    id: Option<String>,
}

/// Identity extracted from a provider session blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderIdentity {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl ProviderIdentity {
    /// Decodes a provider blob, preferring `session.userId` over `user.id`.
    ///
    /// Blobs without a usable user ID are malformed. Expiry is not checked
    /// here.
    pub fn decode(raw: &str) -> Decoded<Self> {
        let Ok(blob) = serde_json::from_str::<ProviderSessionBlob>(raw) else {
            return Decoded::Malformed;
        };

        let user_id = blob
            .session
            .user_id
            .filter(|id| !id.is_empty())
            .or_else(|| blob.user.and_then(|u| u.id).filter(|id| !id.is_empty()));

        match user_id {
            Some(user_id) => Decoded::Valid(Self {
                user_id,
                expires_at: blob.session.expires_at,
            }),
            None => Decoded::Malformed,
        }
    }
}

/// TTL for a tier-1 session entry, or `None` if the session is too close to
/// expiry to be cached at all.
///
/// Rounds down so the entry never outlives the session.
pub fn session_cache_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let remaining = (expires_at - now).num_seconds();
    if remaining <= 0 {
        return None;
    }
    Some((remaining as u64).min(SESSION_CACHE_TTL_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_key_layout() {
        assert_eq!(link_key("abc123"), "urlabc123");
        assert_eq!(session_key("sid"), "session:sid");
        assert_eq!(stats_key("abc123"), "stats:abc123");
    }

    #[test]
    fn test_cached_link_wire_format() {
        let cached = CachedLink {
            target_url: "https://example.com".to_string(),
            status: LinkStatus::Active,
        };

        assert_eq!(
            cached.encode().unwrap(),
            r#"{"target_url":"https://example.com","status":"ACTIVE"}"#
        );
    }

    #[test]
    fn test_cached_link_rejects_other_shapes() {
        assert_eq!(CachedLink::decode("https://example.com"), Decoded::Malformed);
        assert_eq!(
            CachedLink::decode(r#"{"target_url":"https://example.com"}"#),
            Decoded::Malformed
        );
        assert_eq!(
            CachedLink::decode(r#"{"target_url":"https://e.com","status":"DELETED"}"#),
            Decoded::Malformed
        );
        assert_eq!(
            CachedLink::decode(r#"{"target_url":"https://e.com","status":"ACTIVE","x":1}"#),
            Decoded::Malformed
        );
    }

    #[test]
    fn test_cached_link_decodes_paused() {
        let decoded = CachedLink::decode(r#"{"target_url":"https://e.com","status":"PAUSED"}"#);

        assert_eq!(
            decoded,
            Decoded::Valid(CachedLink {
                target_url: "https://e.com".to_string(),
                status: LinkStatus::Paused,
            })
        );
    }

    #[test]
    fn test_cached_session_carries_expiry() {
        let expires_at = Utc::now() + Duration::minutes(5);
        let cached = CachedSession {
            user_id: "user-1".to_string(),
            expires_at,
        };

        let decoded = CachedSession::decode(&cached.encode().unwrap());

        assert_eq!(decoded, Decoded::Valid(cached));
    }

    #[test]
    fn test_cached_session_rejects_bare_user_id() {
        assert_eq!(CachedSession::decode("user-1"), Decoded::Malformed);
        assert_eq!(
            CachedSession::decode(r#"{"user_id":"","expires_at":"2099-01-01T00:00:00Z"}"#),
            Decoded::Malformed
        );
        assert_eq!(
            CachedSession::decode(r#"{"user_id":"u"}"#),
            Decoded::Malformed
        );
    }

    #[test]
    fn test_provider_identity_prefers_session_user_id() {
        let raw = r#"{
            "session": {"userId": "from-session", "expiresAt": "2099-01-01T00:00:00Z"},
            "user": {"id": "from-user"}
        }"#;

        match ProviderIdentity::decode(raw) {
            Decoded::Valid(identity) => assert_eq!(identity.user_id, "from-session"),
            Decoded::Malformed => panic!("expected a valid identity"),
        }
    }

    #[test]
    fn test_provider_identity_falls_back_to_user_id() {
        let raw = r#"{
            "session": {"expiresAt": "2099-01-01T00:00:00Z"},
            "user": {"id": "from-user"}
        }"#;

        match ProviderIdentity::decode(raw) {
            Decoded::Valid(identity) => assert_eq!(identity.user_id, "from-user"),
            Decoded::Malformed => panic!("expected a valid identity"),
        }
    }

    #[test]
    fn test_provider_identity_malformed() {
        assert_eq!(ProviderIdentity::decode("user-42"), Decoded::Malformed);
        assert_eq!(
            ProviderIdentity::decode(r#"{"session": {"userId": "u"}}"#),
            Decoded::Malformed
        );
        assert_eq!(
            ProviderIdentity::decode(r#"{"session": {"expiresAt": "2099-01-01T00:00:00Z"}}"#),
            Decoded::Malformed
        );
    }

    #[test]
    fn test_session_cache_ttl_is_clamped() {
        let now = Utc::now();

        assert_eq!(
            session_cache_ttl(now + Duration::hours(1), now),
            Some(SESSION_CACHE_TTL_SECS)
        );
        assert_eq!(session_cache_ttl(now + Duration::seconds(5), now), Some(5));
        assert_eq!(
            session_cache_ttl(now + Duration::milliseconds(900), now),
            None
        );
        assert_eq!(session_cache_ttl(now - Duration::seconds(5), now), None);
    }
}
