//! Token authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Name of the request header carrying the access token.
pub const TOKEN_HEADER: &str = "token";

/// Authenticates requests using the access token from the `token` header.
///
/// # Header Format
///
/// ```text
/// token: <jwt>
/// ```
///
/// On success the resolved [`AuthUser`](crate::application::services::AuthUser)
/// is stored in the request extensions for handlers to extract with
/// `Extension<AuthUser>`.
///
/// # Errors
///
/// Returns `401 Unauthorized` if:
/// - the header is missing or blank (`Missing verification token`)
/// - the token fails verification (`Invalid verification token`)
pub async fn layer(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized(
                "Missing verification token",
                json!({ "reason": "token header is missing" }),
            )
        })?;

    let user = st.auth_service.authenticate(token).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
