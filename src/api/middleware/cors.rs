//! CORS policy for the browser frontend.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Builds the CORS layer.
///
/// Only `allowed_origin` may send the session cookie cross-origin. Without a
/// configured origin any site may read public responses, but credentials are
/// never allowed, so browsers drop the cookie and `/api/shorten` answers 401.
pub fn layer(allowed_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    match allowed_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => cors.allow_origin(origin).allow_credentials(true),
        None => cors.allow_origin(Any),
    }
}
