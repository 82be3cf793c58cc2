//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, the background failure logger,
//! and the Axum server lifecycle.

use crate::application::background::{BackgroundTasks, run_failure_logger};
use crate::application::services::{LinkService, SessionValidator};
use crate::config::Config;
use crate::domain::repositories::{LinkRepository, SessionRepository};
use crate::infrastructure::cache::{CacheService, MemoryCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgLinkRepository, PgSessionRepository};
use crate::api::middleware::rate_limit::RateLimit;
use crate::routes::{RouterOptions, app_router};
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long pending cache writes and click increments may run after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How often the in-process cache drops expired entries.
const MEMORY_CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Redis cache (in-process cache if not configured, NullCache if unreachable)
/// - Background failure logger
/// - Axum HTTP server with graceful shutdown
///
/// Schema migrations are owned by the identity provider and link management
/// tooling; this process only reads and writes existing tables.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    let cache = build_cache(&config).await;

    let (tasks, failures) = BackgroundTasks::new(config.background_queue_capacity);
    let logger = tokio::spawn(run_failure_logger(failures));
    tracing::info!("Background failure logger started");

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let session_repository: Arc<dyn SessionRepository> =
        Arc::new(PgSessionRepository::new(pool.clone()));

    let link_service = LinkService::new(link_repository.clone(), cache.clone(), tasks.clone())
        .with_link_cache_ttl(config.cache_ttl_seconds);
    let session_validator = SessionValidator::new(session_repository, cache.clone(), tasks.clone())
        .with_provider_cache(config.session_provider_cache);

    let state = AppState {
        link_service: Arc::new(link_service),
        session_validator: Arc::new(session_validator),
        link_repository,
        cache,
        tasks: tasks.clone(),
        short_url_domain: config.short_url_domain.clone(),
        started_at: Instant::now(),
    };

    let options = RouterOptions {
        allowed_origin: config.allowed_origin.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_seconds),
        public_rate_limit: RateLimit {
            requests_per_second: config.rate_limit_per_second,
            burst: config.rate_limit_burst,
        },
        shorten_rate_limit: RateLimit {
            requests_per_second: config.shorten_rate_limit_per_second,
            burst: config.shorten_rate_limit_burst,
        },
    };
    let app = app_router(state, &options)?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, draining background tasks");
    let remaining = tasks.drain(SHUTDOWN_GRACE).await;
    if remaining > 0 {
        tracing::warn!(remaining, "Background tasks still running at shutdown");
    }

    // The logger exits once the last task handle is gone.
    drop(tasks);
    if tokio::time::timeout(Duration::from_secs(1), logger).await.is_err() {
        tracing::debug!("Failure logger did not stop in time");
    }
    pool.close().await;

    Ok(())
}

/// Selects the cache backend.
///
/// A configured but unreachable Redis degrades to [`NullCache`]: every lookup
/// goes to the database until the process is restarted.
async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    let op_timeout = Duration::from_millis(config.cache_op_timeout_ms);

    match &config.redis_url {
        Some(redis_url) => match RedisCache::connect(redis_url, op_timeout).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        },
        None => {
            tracing::info!("Redis not configured, using in-process cache");
            let memory = Arc::new(MemoryCache::new());
            spawn_memory_purge(memory.clone());
            memory as Arc<dyn CacheService>
        }
    }
}

fn spawn_memory_purge(cache: Arc<MemoryCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MEMORY_CACHE_PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            cache.purge_expired();
        }
    });
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
