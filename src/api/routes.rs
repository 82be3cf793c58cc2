//! API route configuration.

use crate::api::handlers::{resolve_handler, shorten_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes that require a valid session.
///
/// # Endpoints
///
/// - `POST /shorten` - Create a short link owned by the session's user
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/shorten", post(shorten_handler))
}

/// Routes available without a session.
///
/// # Endpoints
///
/// - `GET /resolve/{slug}` - Target URL of a short link, as JSON
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/resolve/{slug}", get(resolve_handler))
}
