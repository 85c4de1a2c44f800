use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Envelope-shaped 404 for unmatched routes.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::not_found("Route not found", json!({ "path": uri.path() }))
}
