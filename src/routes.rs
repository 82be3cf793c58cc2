//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`                    - Service info (public)
//! - `GET  /health`              - Health check: DB, cache, background tasks (public)
//! - `GET  /{slug}`              - Short link redirect (public)
//! - `GET  /api/resolve/{slug}`  - Target URL as JSON (public)
//! - `POST /api/shorten`         - Link creation (session cookie required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Credentialed requests from the frontend origin
//! - **Timeout** - Per-request deadline
//! - **Rate limiting** - Per-IP on public routes, per-user on `/api/shorten`
//! - **Authentication** - Session cookie on `/api/shorten`
//! - **Path normalization** - Trailing slash handling

use std::time::Duration;

use crate::api;
use crate::api::handlers::{health_handler, index_handler, redirect_handler};
use crate::api::middleware::rate_limit::{self, InvalidRateLimit, RateLimit};
use crate::api::middleware::{auth, cors, tracing};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;

/// Router-level settings taken from configuration.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Origin allowed credentialed requests; `None` disables credentials.
    pub allowed_origin: Option<String>,
    pub request_timeout: Duration,
    /// Per-IP limit on redirects and resolution.
    pub public_rate_limit: RateLimit,
    /// Per-user limit on link creation.
    pub shorten_rate_limit: RateLimit,
}

/// Constructs the application router with all routes and middleware.
///
/// The returned service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>` so the rate limiter
/// can key on the peer address.
///
/// # Errors
///
/// Returns [`InvalidRateLimit`] if a rate or burst is zero.
pub fn app_router(
    state: AppState,
    options: &RouterOptions,
) -> Result<NormalizePath<Router>, InvalidRateLimit> {
    // The user limiter runs inside auth so it can see `AuthenticatedUser`.
    let api_protected = api::routes::protected_routes()
        .route_layer(rate_limit::shorten_layer(options.shorten_rate_limit)?)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let public_limit = rate_limit::public_layer(options.public_rate_limit)?;
    let api_public = api::routes::public_routes().layer(public_limit.clone());

    let redirects = Router::new()
        .route("/{slug}", get(redirect_handler))
        .layer(public_limit);

    let router = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_protected.merge(api_public))
        .merge(redirects)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(cors::layer(options.allowed_origin.as_deref()))
        .layer(tracing::layer());

    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}
