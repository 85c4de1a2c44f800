//! Rate limiting middleware using token bucket algorithm.
//!
//! Limits are keyed per client IP. Which IP that is depends on the
//! deployment: behind a trusted reverse proxy the address comes from
//! `X-Forwarded-For` / `X-Real-IP` ([`SmartIpKeyExtractor`]), otherwise from
//! the socket peer ([`PeerIpKeyExtractor`]).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor,
};

use crate::api::dto::envelope::ApiResponse;

pub use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};

pub type RateLimitLayer<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates a rate limiter for public endpoints (redirects, health).
///
/// # Limits
///
/// - **Replenish**: one request every 2 seconds
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer<K: KeyExtractor>(key_extractor: K) -> RateLimitLayer<K> {
    build(key_extractor, 2, 100)
}

/// Creates a stricter rate limiter for credential and link management endpoints.
///
/// # Limits
///
/// - **Replenish**: one request every second
/// - **Burst**: 10 requests
pub fn secure_layer<K: KeyExtractor>(key_extractor: K) -> RateLimitLayer<K> {
    build(key_extractor, 1, 10)
}

fn build<K: KeyExtractor>(key_extractor: K, replenish_seconds: u64, burst_size: u32) -> RateLimitLayer<K> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(replenish_seconds)
            .burst_size(burst_size)
            .finish()
            .expect("static rate limit configuration is valid"),
    );

    GovernorLayer::new(governor_conf).error_handler(error_response)
}

/// Renders limiter rejections in the response envelope.
///
/// Retry headers set by the limiter are kept.
fn error_response(error: GovernorError) -> Response {
    let (status, headers, msg) = match error {
        GovernorError::TooManyRequests { wait_time, headers } => (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            format!("Too many requests, retry in {}s", wait_time),
        ),
        GovernorError::UnableToExtractKey => {
            tracing::error!("Rate limiter could not determine the client IP");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                "Internal server error".to_string(),
            )
        }
        GovernorError::Other { code, msg, headers } => (
            code,
            headers,
            msg.unwrap_or_else(|| "Request rejected".to_string()),
        ),
    };

    let reason = status.canonical_reason().unwrap_or("Error");
    let mut response = (status, Json(ApiResponse::<()>::failure(reason, msg))).into_response();
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
}
