//! Link entity representing a shortened URL mapping.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access state of a link.
///
/// A [`LinkStatus::Paused`] link is never redirected, whether it is served from
/// the cache or from the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Active,
    Paused,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "ACTIVE",
            LinkStatus::Paused => "PAUSED",
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, LinkStatus::Paused)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not a known [`LinkStatus`].
#[derive(Debug, thiserror::Error)]
#[error("unknown link status: {0}")]
pub struct UnknownLinkStatus(pub String);

impl FromStr for LinkStatus {
    type Err = UnknownLinkStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(LinkStatus::Active),
            "PAUSED" => Ok(LinkStatus::Paused),
            other => Err(UnknownLinkStatus(other.to_string())),
        }
    }
}

/// A persisted short link.
///
/// `short_id` is unique across all links. `clicks` is authoritative here and
/// only ever incremented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub id: String,
    pub short_id: String,
    pub target_url: String,
    /// Owner of the link.
    ///
    /// Nullable in storage, but link creation always requires an owner, so
    /// `None` is only observed on rows written outside this service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub status: LinkStatus,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Returns true if resolution of this link must be blocked.
    pub fn is_paused(&self) -> bool {
        self.status.is_paused()
    }
}

/// Input data for persisting a new link.
///
/// New links always start [`LinkStatus::Active`] with zero clicks; the store
/// assigns `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub id: String,
    pub short_id: String,
    pub target_url: String,
    pub user_id: String,
    pub status: LinkStatus,
}

impl NewLink {
    pub fn active(id: String, short_id: String, target_url: String, user_id: String) -> Self {
        Self {
            id,
            short_id,
            target_url,
            user_id,
            status: LinkStatus::Active,
        }
    }

    /// Builds the persisted entity from the values returned by the store.
    pub fn into_link(self, clicks: i64, created_at: DateTime<Utc>) -> Link {
        Link {
            id: self.id,
            short_id: self.short_id,
            target_url: self.target_url,
            user_id: Some(self.user_id),
            status: self.status,
            clicks,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [LinkStatus::Active, LinkStatus::Paused] {
            assert_eq!(status.as_str().parse::<LinkStatus>().unwrap(), status);
        }
        assert!("DELETED".parse::<LinkStatus>().is_err());
        assert!("active".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&LinkStatus::Paused).unwrap(),
            "\"PAUSED\""
        );
    }

    #[test]
    fn test_new_link_is_active() {
        let new_link = NewLink::active(
            "0b1f6c1e-0000-4000-8000-000000000000".to_string(),
            "0b1f6c".to_string(),
            "https://example.com".to_string(),
            "user-1".to_string(),
        );

        assert_eq!(new_link.status, LinkStatus::Active);
    }

    #[test]
    fn test_into_link_carries_owner_and_store_values() {
        let now = Utc::now();
        let link = NewLink::active(
            "id-1".to_string(),
            "my-slug".to_string(),
            "https://example.com".to_string(),
            "user-1".to_string(),
        )
        .into_link(0, now);

        assert_eq!(link.short_id, "my-slug");
        assert_eq!(link.user_id.as_deref(), Some("user-1"));
        assert_eq!(link.clicks, 0);
        assert_eq!(link.created_at, now);
        assert!(!link.is_paused());
    }
}
