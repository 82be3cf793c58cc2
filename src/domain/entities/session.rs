//! Session record owned by the external identity provider.

use chrono::{DateTime, Utc};

/// An active session row as read from the durable session store.
///
/// Sessions are issued elsewhere; this service only validates them.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A session is valid only while its expiry is strictly in the future.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Returns the session ID of an opaque session token.
///
/// The session ID is the part of the token before the first `.`; a token
/// without a delimiter is its own session ID.
pub fn session_id(token: &str) -> &str {
    token.split_once('.').map_or(token, |(id, _)| id)
}
