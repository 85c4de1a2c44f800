//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /signup`, `POST /signin`  - Accounts (public, strict rate limit)
//! - `/shortLink/*`                  - Link management (`token` header required)
//! - `GET  /{code}`, `GET /r/{code}` - Short link redirect (public)
//! - `GET  /health`                  - Health check: DB, cache, click queue (public)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Single allowed frontend origin with credentials
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Authentication** - `token` header verified as a signed access token
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::not_found_handler;
use crate::api::middleware::rate_limit::{self, PeerIpKeyExtractor, SmartIpKeyExtractor};
use crate::api::middleware::{auth, cors, tracing};
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::{Router, middleware};
use tower::Layer;
use tower_governor::key_extractor::KeyExtractor;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// HTTP-level options that shape the router.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// When `true`, rate limiting reads client IP from `X-Forwarded-For` /
    /// `X-Real-IP` headers instead of the peer socket address; enable only
    /// when the service runs behind a trusted reverse proxy.
    pub behind_proxy: bool,
    /// Origin allowed by CORS. `None` disables cross-origin access.
    pub cors_allowed_origin: Option<HeaderValue>,
}

/// Constructs the application router with all routes and middleware,
/// wrapped in trailing-slash normalization.
pub fn app_router(state: AppState, options: &RouterOptions) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, options))
}

/// Constructs the application router without path normalization.
///
/// Integration tests drive this directly.
pub fn router(state: AppState, options: &RouterOptions) -> Router {
    if options.behind_proxy {
        build(state, options, SmartIpKeyExtractor)
    } else {
        build(state, options, PeerIpKeyExtractor)
    }
}

fn build<K>(state: AppState, options: &RouterOptions, key_extractor: K) -> Router
where
    K: KeyExtractor + Send + Sync + 'static,
    K::Key: Send + Sync + 'static,
{
    let links = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::secure_layer(key_extractor.clone()));

    let accounts = api::routes::account_routes()
        .layer(rate_limit::secure_layer(key_extractor.clone()));

    let public = api::routes::public_routes().layer(rate_limit::layer(key_extractor));

    Router::new()
        .merge(accounts)
        .merge(links)
        .merge(public)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(cors::layer(options.cors_allowed_origin.clone()))
        .layer(tracing::layer())
}
