//! Handler for the public resolve endpoint used by the frontend.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::api::dto::resolve::ResolveResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Cache policy for successful resolutions.
pub const RESOLVE_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60, stale-while-revalidate=300";

/// Returns the target URL of a short ID without redirecting.
///
/// # Endpoint
///
/// `GET /api/resolve/{slug}`
///
/// # Response
///
/// ```json
/// { "target_url": "https://example.com" }
/// ```
///
/// # Errors
///
/// Returns 404 Not Found if the slug is unknown or the link is paused.
pub async fn resolve_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let target_url = state.link_service.resolve_url(&slug).await?;

    Ok((
        [(header::CACHE_CONTROL, RESOLVE_CACHE_CONTROL)],
        Json(ResolveResponse { target_url }),
    ))
}
