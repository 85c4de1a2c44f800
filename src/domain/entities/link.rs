//! Short link entity and its creation/update inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short code owned by a user and pointing at a destination URL.
///
/// `short_code` is assigned once at creation and never changes. Deleting a
/// link only clears `is_active`, so a later create for the same
/// (owner, URL) pair can bring the same row back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub user_id: i64,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Whether a visitor hitting this code should be redirected.
    pub fn is_resolvable(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// Input data for inserting a new link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub short_code: String,
    pub original_url: String,
    pub user_id: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortLinkPatch {
    pub original_url: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl ShortLinkPatch {
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none() && self.is_active.is_none() && self.expires_at.is_none()
    }

    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }
}
