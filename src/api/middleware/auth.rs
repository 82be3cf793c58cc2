//! Session cookie authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tracing::debug;

use crate::{error::AppError, state::AppState, utils::session_cookie::extract_session_token};

/// User ID of the session that authenticated the request.
///
/// Inserted into request extensions by [`layer`]; handlers read it with
/// `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Authenticates requests using the identity provider's session cookie.
///
/// # Cookie Format
///
/// ```text
/// Cookie: __Secure-better-auth.session_token=<sid>.<signature>
/// Cookie: better-auth.session_token=<sid>.<signature>
/// ```
///
/// # Authentication Flow
///
/// 1. Extract the session token from the `Cookie` header
/// 2. Validate it through the session cache tiers and the session table
/// 3. Attach [`AuthenticatedUser`] to the request
/// 4. Continue to next middleware/handler
///
/// # Errors
///
/// Returns `401 Unauthorized` if:
/// - The `Cookie` header or the session cookie is missing ("No session found")
/// - The session is unknown or expired ("Invalid or expired session")
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::post, middleware};
/// use crate::api::middleware::auth;
///
/// let protected = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok());

    let token = extract_session_token(cookie_header).map_err(|e| {
        debug!(reason = %e, "Rejecting request without session");
        AppError::unauthorized("No session found", json!({ "reason": e.to_string() }))
    })?;

    let user_id = st
        .session_validator
        .validate_session(&token)
        .await
        .map_err(|e| match e {
            AppError::Validation { .. } => AppError::unauthorized(
                "No session found",
                json!({ "reason": "empty session token" }),
            ),
            other => other,
        })?;

    req.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(req).await)
}
