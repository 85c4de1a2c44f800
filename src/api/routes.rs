//! API route configuration.
//!
//! Routes are split by access level: [`public_routes`] need no credentials,
//! [`protected_routes`] are wrapped in [`crate::api::middleware::auth`] by
//! the top-level router.

use crate::api::handlers::{
    analytics_handler, create_link_handler, delete_link_handler, get_link_handler,
    health_handler, list_links_handler, missing_code_handler, redirect_handler, signin_handler,
    signup_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Account routes.
///
/// # Endpoints
///
/// - `POST /signup` - Register an account
/// - `POST /signin` - Exchange credentials for an access token
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/signin", post(signin_handler))
}

/// Public routes.
///
/// # Endpoints
///
/// - `GET /health`        - Component health
/// - `GET /{code}`        - Short link redirect
/// - `GET /r/{code}`      - Short link redirect (prefixed form)
/// - `GET /`, `GET /r`    - Missing short code (400)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(missing_code_handler))
        .route("/r", get(missing_code_handler))
        .route("/{code}", get(redirect_handler))
        .route("/r/{code}", get(redirect_handler))
}

/// Link management routes. The caller is always the authenticated user.
///
/// # Endpoints
///
/// - `POST   /shortLink`                - Create (or reuse) a short link
/// - `GET    /shortLink`                - List active links
/// - `GET    /shortLink/{id}`           - Fetch one link
/// - `PATCH  /shortLink/{id}`           - Partially update a link
/// - `DELETE /shortLink/{id}`           - Deactivate a link
/// - `GET    /shortLink/{id}/analytics` - Click analytics for a link
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shortLink",
            get(list_links_handler).post(create_link_handler),
        )
        .route(
            "/shortLink/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/shortLink/{id}/analytics", get(analytics_handler))
}
