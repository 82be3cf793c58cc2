//! Redis-backed cache implementation.

use std::future::Future;
use std::time::Duration;

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use tracing::{debug, info};

/// Redis cache shared by every service instance.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Every command is bounded by a client-side timeout so a slow Redis cannot
/// stall a request for longer than `op_timeout`.
pub struct RedisCache {
    client: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `op_timeout` - Upper bound for every cache command; controlled via
    ///   `CACHE_OP_TIMEOUT_MS`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = tokio::time::timeout(op_timeout * 5, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::ConnectionError("Timed out connecting to Redis".to_string()))?
            .map_err(|e| {
                CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
            })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            op_timeout,
        })
    }

    /// Runs a Redis command under the configured timeout.
    async fn bounded<T, F>(&self, op: &str, key: &str, fut: F) -> CacheResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::OperationError(format!(
                "{} {} failed: {}",
                op, key, e
            ))),
            Err(_) => Err(CacheError::Timeout(format!(
                "{} {} exceeded {:?}",
                op, key, self.op_timeout
            ))),
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();
        let value = self
            .bounded("GET", key, conn.get::<_, Option<String>>(key))
            .await?;

        match &value {
            Some(_) => debug!("Cache HIT: {}", key),
            None => debug!("Cache MISS: {}", key),
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut conn = self.client.clone();
        self.bounded("SET", key, conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await?;

        debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    async fn increment_counter(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();
        self.bounded("INCR", key, conn.incr::<_, _, i64>(key, 1))
            .await?;

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded("PING", "", conn.ping::<()>()).await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
