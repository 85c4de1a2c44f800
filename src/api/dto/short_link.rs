//! DTOs for the short link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{ShortLink, ShortLinkPatch};

/// Request body for `POST /shortLink`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "originalUrl must be 1-2048 characters"))]
    pub original_url: String,

    /// Optional expiry; must be in the future.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /shortLink/{id}`.
///
/// All fields are optional, but at least one must be present.
///
/// # `expiresAt` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear expiry (link never expires)
/// - **Timestamp** → set new expiry
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShortLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "originalUrl must be 1-2048 characters"))]
    pub original_url: Option<String>,

    pub is_active: Option<bool>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateShortLinkRequest> for ShortLinkPatch {
    fn from(req: UpdateShortLinkRequest) -> Self {
        Self {
            original_url: req.original_url,
            is_active: req.is_active,
            expires_at: req.expires_at,
        }
    }
}

/// Link record returned by every short link endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortLinkResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub user_id: i64,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShortLinkResponse {
    /// Builds the record, deriving `shortUrl` from the public base URL.
    pub fn from_link(link: ShortLink, public_base_url: &str) -> Self {
        let short_url = format!("{}/{}", public_base_url.trim_end_matches('/'), link.short_code);

        Self {
            id: link.id,
            short_code: link.short_code,
            short_url,
            original_url: link.original_url,
            user_id: link.user_id,
            is_active: link.is_active,
            expires_at: link.expires_at,
            created_at: link.created_at,
        }
    }
}
