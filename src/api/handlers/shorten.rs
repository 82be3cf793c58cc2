//! Handler for link shortening endpoint.

use axum::extract::{State, rejection::JsonRejection};
use axum::{Extension, Json};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::slug::is_reserved_slug;

/// Creates a short link owned by the authenticated user.
///
/// # Endpoint
///
/// `POST /api/shorten` (session cookie required)
///
/// # Request Body
///
/// ```json
/// {
///   "target_url": "https://example.com/some/long/path",
///   "custom_slug": "my-link"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "short_url": "https://sho.rt/my-link",
///   "details": {
///     "id": "0b7c...",
///     "short_id": "my-link",
///     "target_url": "https://example.com/some/long/path",
///     "user_id": "user-1",
///     "status": "ACTIVE",
///     "clicks": 0,
///     "created_at": "2025-01-01T00:00:00Z"
///   }
/// }
/// ```
///
/// # Errors
///
/// - 400 if the body is malformed or invalid, or the slug is reserved
/// - 401 if the session is missing or invalid
/// - 409 if the custom slug is already taken
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let slug = payload.slug();
    if !slug.is_empty() && is_reserved_slug(slug) {
        return Err(AppError::bad_request(
            format!("The slug '{}' is reserved and cannot be used", slug),
            json!({ "custom_slug": slug }),
        ));
    }

    let link = state
        .link_service
        .shorten_url(&payload.target_url, slug, Some(&user_id))
        .await?;

    Ok(Json(ShortenResponse {
        short_url: state.short_url(&link.short_id),
        details: link,
    }))
}
