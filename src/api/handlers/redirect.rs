//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short ID to its target URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// Resolution goes through the link cache first and falls back to the
/// database; click counting happens in the background.
///
/// # Errors
///
/// Returns 404 Not Found if the slug is unknown or the link is paused.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let target_url = state.link_service.resolve_url(&slug).await?;

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, target_url)],
    )
        .into_response())
}
