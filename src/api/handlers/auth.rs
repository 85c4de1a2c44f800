//! Handlers for account creation and sign-in.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::auth::{SigninRequest, SignupRequest};
use crate::api::dto::envelope::ApiResponse;
use crate::api::extract::ValidatedJson;
use crate::error::AppError;
use crate::state::AppState;

/// Registers a new account.
///
/// # Endpoint
///
/// `POST /signup`
///
/// # Request Body
///
/// ```json
/// { "email": "alice@example.com", "password": "correct-horse", "username": "alice" }
/// ```
///
/// # Responses
///
/// - **201 Created**: `data` is `null`
/// - **400 Bad Request**: body missing fields or out of bounds
/// - **409 Conflict**: email already registered
pub async fn signup_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), AppError> {
    state
        .auth_service
        .signup(&payload.email, &payload.password, &payload.username)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("User created successfully")),
    ))
}

/// Exchanges credentials for an access token.
///
/// # Endpoint
///
/// `POST /signin`
///
/// # Responses
///
/// - **200 OK**: `data` is the token to send in the `token` header
/// - **401 Unauthorized**: malformed body or wrong credentials
pub async fn signin_handler(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::unauthorized(
            "Invalid request body",
            json!({ "reason": rejection.body_text() }),
        )
    })?;

    payload.validate().map_err(|errors| {
        AppError::unauthorized(
            "Invalid request body",
            json!({ "reason": errors.to_string() }),
        )
    })?;

    let token = state
        .auth_service
        .signin(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(token, "SignedIn successfully")))
}
