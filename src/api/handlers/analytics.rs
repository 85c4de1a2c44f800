//! Handler for per-link click analytics.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use super::links::parse_link_id;
use crate::api::dto::analytics::AnalyticsResponse;
use crate::api::dto::envelope::ApiResponse;
use crate::application::services::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Returns click totals and country/browser/device breakdowns for a link.
///
/// # Endpoint
///
/// `GET /shortLink/{id}/analytics`
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "totalClicks": 3,
///     "clicksByCountry": [{ "country": "DE", "count": 2 }, { "country": "UN", "count": 1 }],
///     "clicksByBrowser": [{ "browser": "Firefox", "count": 3 }],
///     "clicksByDevice": [{ "device": "desktop", "count": 3 }]
///   },
///   "error": null,
///   "msg": "Analytics retrieved successfully"
/// }
/// ```
///
/// Each grouping sums to `totalClicks`. Groups are ordered by count
/// descending, then key ascending.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AnalyticsResponse>>, AppError> {
    let id = parse_link_id(&id)?;
    let analytics = state.analytics_service.link_analytics(user.id, id).await?;

    Ok(Json(ApiResponse::success(
        AnalyticsResponse::from(analytics),
        "Analytics retrieved successfully",
    )))
}
