//! Cache service trait, cached value and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::ShortLink;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// What the redirect path needs to know about an active link.
///
/// Only active links are cached; deactivation and updates invalidate the
/// entry. `expires_at` is kept so an entry that outlives its link's expiry is
/// still rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLink {
    pub id: i64,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedLink {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }
}

impl From<&ShortLink> for CachedLink {
    fn from(link: &ShortLink) -> Self {
        Self {
            id: link.id,
            original_url: link.original_url.clone(),
            expires_at: link.expires_at,
        }
    }
}

/// Trait for caching short code lookups.
///
/// Implementations must be thread-safe and handle errors gracefully without
/// disrupting the application (cache failures should degrade to database lookups).
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached link for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_link(&self, short_code: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores a link with an optional TTL in seconds.
    ///
    /// `None` uses the implementation's default TTL.
    async fn set_link(
        &self,
        short_code: &str,
        link: &CachedLink,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached link.
    ///
    /// Used when a link is deactivated or modified.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
