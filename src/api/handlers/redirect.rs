//! Public short code redirect.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}` (also served at `GET /r/{code}`)
///
/// # Responses
///
/// - **302 Found**: `Location` is the original URL
/// - **400 Bad Request**: blank code
/// - **404 Not Found**: unknown, inactive or expired link
///
/// # Click tracking
///
/// The click is handed to the background worker with a non-blocking send
/// and the redirect is returned without waiting for the log write. When the
/// queue is full the click is dropped and counted; the redirect still
/// succeeds.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let target = state.link_service.resolve_for_redirect(&code).await?;

    let location = HeaderValue::from_str(&target.original_url).map_err(|e| {
        AppError::internal(
            "Internal server error",
            json!({ "link_id": target.id, "reason": e.to_string() }),
        )
    })?;

    let event = ClickEvent::new(
        target.id,
        header_str(&headers, "x-forwarded-for"),
        Some(peer.ip()),
        header_str(&headers, header::USER_AGENT.as_str()),
    );

    match state.click_sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            metrics::counter!("click_events_dropped_total", "reason" => "full").increment(1);
            tracing::warn!(link_id = target.id, "Click queue full, dropping event");
        }
        Err(TrySendError::Closed(_)) => {
            metrics::counter!("click_events_dropped_total", "reason" => "closed").increment(1);
            tracing::error!(link_id = target.id, "Click queue closed, dropping event");
        }
    }

    metrics::counter!("redirects_total").increment(1);

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Redirect paths without a short code.
///
/// # Endpoint
///
/// `GET /` and `GET /r`
///
/// # Responses
///
/// - **400 Bad Request**: always
pub async fn missing_code_handler() -> AppError {
    AppError::bad_request("Short code is required", json!({}))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
