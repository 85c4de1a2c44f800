//! Handlers for the owner-scoped short link endpoints.
//!
//! Every handler here runs behind [`crate::api::middleware::auth`] and acts
//! only on links owned by the authenticated user.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;

use crate::api::dto::envelope::ApiResponse;
use crate::api::dto::short_link::{
    CreateShortLinkRequest, ShortLinkResponse, UpdateShortLinkRequest,
};
use crate::api::extract::ValidatedJson;
use crate::application::services::{AuthUser, CreateOutcome};
use crate::error::AppError;
use crate::state::AppState;

type LinkResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

/// Parses the `{id}` path segment.
///
/// Blank, non-numeric and non-positive ids are rejected with 400.
pub(crate) fn parse_link_id(raw: &str) -> Result<i64, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::bad_request("Short link id is required", json!({})));
    }

    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("Invalid short link id", json!({ "id": raw })))
}

/// Creates a short link, or returns the caller's existing one for the URL.
///
/// # Endpoint
///
/// `POST /shortLink`
///
/// # Responses
///
/// - **201 Created**: new link
/// - **200 OK**: an inactive link was reactivated, or an active one already existed
/// - **400 Bad Request**: invalid URL or past `expiresAt`
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateShortLinkRequest>,
) -> LinkResult<ShortLinkResponse> {
    let outcome = state
        .link_service
        .create(user.id, &payload.original_url, payload.expires_at)
        .await?;

    let (status, msg) = match &outcome {
        CreateOutcome::Created(_) => (StatusCode::CREATED, "Short link generated successfully"),
        CreateOutcome::Reactivated(_) => (StatusCode::OK, "Short link reactivated successfully"),
        CreateOutcome::Existing(_) => (StatusCode::OK, "Short link already exists"),
    };

    let body = ShortLinkResponse::from_link(outcome.into_link(), &state.public_base_url);
    Ok((status, Json(ApiResponse::success(body, msg))))
}

/// Lists the caller's active links, newest first.
///
/// # Endpoint
///
/// `GET /shortLink`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> LinkResult<Vec<ShortLinkResponse>> {
    let links = state.link_service.list(user.id).await?;

    let body = links
        .into_iter()
        .map(|link| ShortLinkResponse::from_link(link, &state.public_base_url))
        .collect();

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(body, "Short links retrieved successfully")),
    ))
}

/// Fetches one of the caller's links.
///
/// # Endpoint
///
/// `GET /shortLink/{id}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> LinkResult<ShortLinkResponse> {
    let id = parse_link_id(&id)?;
    let link = state.link_service.get(user.id, id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            ShortLinkResponse::from_link(link, &state.public_base_url),
            "Short link retrieved successfully",
        )),
    ))
}

/// Deactivates one of the caller's links. The row is kept for analytics.
///
/// # Endpoint
///
/// `DELETE /shortLink/{id}`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> LinkResult<ShortLinkResponse> {
    let id = parse_link_id(&id)?;
    let link = state.link_service.deactivate(user.id, id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            ShortLinkResponse::from_link(link, &state.public_base_url),
            "Short link deleted successfully",
        )),
    ))
}

/// Partially updates one of the caller's links.
///
/// # Endpoint
///
/// `PATCH /shortLink/{id}`
///
/// # Request Body
///
/// ```json
/// { "originalUrl": "https://example.com/new", "isActive": true, "expiresAt": null }
/// ```
///
/// # Responses
///
/// - **200 OK**: updated link
/// - **400 Bad Request**: empty body, invalid URL or past `expiresAt`
/// - **404 Not Found**: not one of the caller's links
/// - **409 Conflict**: the new URL is already one of the caller's links
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateShortLinkRequest>,
) -> LinkResult<ShortLinkResponse> {
    let id = parse_link_id(&id)?;
    let link = state
        .link_service
        .update(user.id, id, payload.into())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            ShortLinkResponse::from_link(link, &state.public_base_url),
            "Short link updated successfully",
        )),
    ))
}
