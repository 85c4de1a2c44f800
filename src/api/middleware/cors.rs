//! Cross-origin policy for the browser frontend.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::auth::TOKEN_HEADER;

/// Builds the CORS layer.
///
/// With an origin configured, only that origin is echoed back and credentials
/// are permitted. Without one, cross-origin requests are not granted.
pub fn layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(TOKEN_HEADER)]);

    match allowed_origin {
        Some(origin) => base
            .allow_origin(AllowOrigin::list([origin]))
            .allow_credentials(true),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_preflight_allows_configured_origin() {
        let app = Router::new()
            .route("/shortLink", get(|| async { "ok" }))
            .layer(layer(Some(HeaderValue::from_static("http://localhost:5173"))));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/shortLink")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_other_origin_is_not_allowed() {
        let app = Router::new()
            .route("/shortLink", get(|| async { "ok" }))
            .layer(layer(Some(HeaderValue::from_static("http://localhost:5173"))));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/shortLink")
                    .header(header::ORIGIN, "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
