//! Token bucket rate limiting.
//!
//! Redirects and resolution are limited per peer IP. Link creation sits behind
//! the session middleware and is limited per authenticated user, so users
//! sharing an address do not starve each other.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::{KeyExtractor, PeerIpKeyExtractor},
};

use crate::api::middleware::auth::AuthenticatedUser;

pub type RateLimitLayer<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Steady request rate plus the burst a client may spend up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests_per_second: u32,
    pub burst: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid rate limit: {requests_per_second} requests/s with burst {burst}")]
pub struct InvalidRateLimit {
    requests_per_second: u32,
    burst: u32,
}

impl RateLimit {
    /// Interval after which one request of the burst is replenished.
    fn replenish_period(&self) -> Option<Duration> {
        (self.requests_per_second > 0).then(|| Duration::from_secs(1) / self.requests_per_second)
    }

    fn governor_config<K: KeyExtractor>(
        &self,
        key_extractor: K,
    ) -> Result<Arc<GovernorConfig<K, NoOpMiddleware<QuantaInstant>>>, InvalidRateLimit> {
        let invalid = || InvalidRateLimit {
            requests_per_second: self.requests_per_second,
            burst: self.burst,
        };
        let period = self.replenish_period().ok_or_else(invalid)?;

        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .period(period)
            .burst_size(self.burst)
            .finish()
            .map(Arc::new)
            .ok_or_else(invalid)
    }
}

/// Keys requests on the [`AuthenticatedUser`] inserted by the auth layer.
///
/// Requests that reach the limiter without one are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserKeyExtractor;

impl KeyExtractor for UserKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        req.extensions()
            .get::<AuthenticatedUser>()
            .map(|AuthenticatedUser(user_id)| user_id.clone())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Creates the per-IP limiter for redirects and resolution.
///
/// Requests exceeding the limit receive `429 Too Many Requests`. The peer
/// address comes from connect info, so the server must be started with
/// `into_make_service_with_connect_info`.
pub fn public_layer(
    limit: RateLimit,
) -> Result<RateLimitLayer<PeerIpKeyExtractor>, InvalidRateLimit> {
    Ok(GovernorLayer::new(limit.governor_config(PeerIpKeyExtractor)?))
}

/// Creates the per-user limiter for link creation.
///
/// Must be installed inside the session middleware.
pub fn shorten_layer(limit: RateLimit) -> Result<RateLimitLayer<UserKeyExtractor>, InvalidRateLimit> {
    Ok(GovernorLayer::new(limit.governor_config(UserKeyExtractor)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replenish_period_follows_rate() {
        let limit = RateLimit {
            requests_per_second: 50,
            burst: 200,
        };

        assert_eq!(limit.replenish_period(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_zero_rate_or_burst_is_rejected() {
        assert!(
            shorten_layer(RateLimit {
                requests_per_second: 0,
                burst: 10,
            })
            .is_err()
        );
        assert!(
            public_layer(RateLimit {
                requests_per_second: 5,
                burst: 0,
            })
            .is_err()
        );
    }

    #[test]
    fn test_user_key_comes_from_request_extensions() {
        let mut req = Request::new(());
        assert!(matches!(
            UserKeyExtractor.extract(&req),
            Err(GovernorError::UnableToExtractKey)
        ));

        req.extensions_mut()
            .insert(AuthenticatedUser("user-1".to_string()));
        assert_eq!(UserKeyExtractor.extract(&req).unwrap(), "user-1");
    }
}
