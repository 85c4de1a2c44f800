//! Short link lifecycle service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::{InsertOutcome, LinkRepository};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedLink};
use crate::utils::code_generator::{SHORT_CODE_LENGTH, generate_code, is_valid_code};
use crate::utils::url_validator::validate_url;

/// Attempts at finding a free short code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// How a create request was satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(ShortLink),
    Reactivated(ShortLink),
    Existing(ShortLink),
}

impl CreateOutcome {
    pub fn link(&self) -> &ShortLink {
        match self {
            Self::Created(link) | Self::Reactivated(link) | Self::Existing(link) => link,
        }
    }

    pub fn into_link(self) -> ShortLink {
        match self {
            Self::Created(link) | Self::Reactivated(link) | Self::Existing(link) => link,
        }
    }

    /// Metric label and log field.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Reactivated(_) => "reactivated",
            Self::Existing(_) => "existing",
        }
    }
}

/// Service for creating, listing, updating and resolving short links.
///
/// Every owner-facing operation is scoped to the caller: a link owned by
/// someone else is reported as not found. The redirect path reads through
/// the cache, and every mutation invalidates the cached entry.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    pub fn new(link_repository: Arc<L>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            link_repository,
            cache,
        }
    }

    /// Creates a short link, or returns the caller's existing one for the URL.
    ///
    /// # Behavior
    ///
    /// - No link for (owner, URL): a fresh code is inserted ([`CreateOutcome::Created`])
    /// - Inactive link: reactivated in place, same code ([`CreateOutcome::Reactivated`])
    /// - Active link: returned unchanged ([`CreateOutcome::Existing`])
    ///
    /// On reactivation a supplied `expires_at` replaces the old one; otherwise
    /// the old expiry is kept unless it has already passed, in which case it
    /// is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not http(s) or
    /// `expires_at` is not in the future.
    /// Returns [`AppError::Internal`] if no free code is found after
    /// `MAX_CODE_ATTEMPTS` tries or on store errors.
    pub async fn create(
        &self,
        user_id: i64,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CreateOutcome, AppError> {
        let original_url = validate_url(original_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;
        ensure_future(expires_at)?;

        let outcome = match self
            .link_repository
            .find_by_owner_and_url(user_id, &original_url)
            .await?
        {
            Some(existing) => self.reuse_existing(existing, expires_at).await?,
            None => self.insert_new(user_id, original_url, expires_at).await?,
        };

        metrics::counter!("short_links_created_total", "outcome" => outcome.label()).increment(1);
        tracing::info!(
            user_id,
            link_id = outcome.link().id,
            code = %outcome.link().short_code,
            outcome = outcome.label(),
            "Short link requested"
        );

        Ok(outcome)
    }

    /// Round-trips to the link store; used by the health check.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.link_repository.ping().await
    }

    /// Lists the caller's active links, newest first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<ShortLink>, AppError> {
        self.link_repository.list_active_by_owner(user_id).await
    }

    /// Fetches one of the caller's links, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs
    /// to another user.
    pub async fn get(&self, user_id: i64, id: i64) -> Result<ShortLink, AppError> {
        self.link_repository
            .find_by_id(id)
            .await?
            .filter(|link| link.is_owned_by(user_id))
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": id })))
    }

    /// Marks a link inactive. Deactivating an inactive link is a no-op.
    pub async fn deactivate(&self, user_id: i64, id: i64) -> Result<ShortLink, AppError> {
        let link = self.get(user_id, id).await?;

        let link = if link.is_active {
            self.apply(link.id, ShortLinkPatch::deactivate()).await?
        } else {
            link
        };

        self.invalidate(&link.short_code).await;
        tracing::info!(user_id, link_id = id, "Short link deactivated");

        Ok(link)
    }

    /// Applies a partial update to one of the caller's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty patch, an invalid URL or
    /// a past `expires_at`.
    /// Returns [`AppError::NotFound`] if the caller does not own the link.
    /// Returns [`AppError::Conflict`] if the new URL is already one of the
    /// caller's other links.
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        mut patch: ShortLinkPatch,
    ) -> Result<ShortLink, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request(
                "At least one of originalUrl, isActive or expiresAt is required",
                json!({}),
            ));
        }

        if let Some(url) = &patch.original_url {
            let validated = validate_url(url).map_err(|e| {
                AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
            })?;
            patch.original_url = Some(validated);
        }

        if let Some(expires_at) = patch.expires_at {
            ensure_future(expires_at)?;
        }

        let link = self.get(user_id, id).await?;
        let updated = self.apply(link.id, patch).await?;

        self.invalidate(&updated.short_code).await;
        tracing::info!(user_id, link_id = id, "Short link updated");

        Ok(updated)
    }

    /// Resolves a public short code to its redirect target.
    ///
    /// Reads through the cache. Unknown, inactive and expired links are all
    /// [`AppError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a blank code.
    pub async fn resolve_for_redirect(&self, code: &str) -> Result<CachedLink, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::bad_request("Short code is required", json!({})));
        }

        let not_found = || AppError::not_found("Short link not found", json!({ "code": code }));

        if !is_valid_code(code) {
            return Err(not_found());
        }

        match self.cache.get_link(code).await {
            Ok(Some(cached)) if !cached.is_expired() => return Ok(cached),
            Ok(Some(_)) => {
                self.invalidate(code).await;
                return Err(not_found());
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Cache error: {}", e),
        }

        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .filter(ShortLink::is_resolvable)
            .ok_or_else(not_found)?;

        let cached = CachedLink::from(&link);
        if let Err(e) = self.cache.set_link(code, &cached, None).await {
            tracing::warn!("Failed to cache link {}: {}", code, e);
        }

        Ok(cached)
    }

    async fn reuse_existing(
        &self,
        existing: ShortLink,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CreateOutcome, AppError> {
        if existing.is_active {
            return Ok(CreateOutcome::Existing(existing));
        }

        let expiry_patch = match expires_at {
            Some(at) => Some(Some(at)),
            None if existing.is_expired() => Some(None),
            None => None,
        };

        let patch = ShortLinkPatch {
            is_active: Some(true),
            expires_at: expiry_patch,
            ..ShortLinkPatch::default()
        };

        let link = self.apply(existing.id, patch).await?;
        self.invalidate(&link.short_code).await;

        Ok(CreateOutcome::Reactivated(link))
    }

    async fn insert_new(
        &self,
        user_id: i64,
        original_url: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CreateOutcome, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let short_code = generate_code(SHORT_CODE_LENGTH).map_err(|e| {
                AppError::internal(
                    "Failed to generate short code",
                    json!({ "reason": e.to_string() }),
                )
            })?;

            let new_link = NewShortLink {
                short_code,
                original_url: original_url.clone(),
                user_id,
                expires_at,
            };

            match self.link_repository.insert(new_link).await? {
                InsertOutcome::Inserted(link) => return Ok(CreateOutcome::Created(link)),
                InsertOutcome::CodeTaken => {
                    tracing::warn!(attempt, "Short code collision, retrying");
                }
                InsertOutcome::DuplicateUrl => {
                    // a concurrent request for the same (owner, URL) won the insert
                    let winner = self
                        .link_repository
                        .find_by_owner_and_url(user_id, &original_url)
                        .await?
                        .ok_or_else(|| {
                            AppError::internal(
                                "Internal server error",
                                json!({ "reason": "duplicate link vanished after insert conflict" }),
                            )
                        })?;
                    return self.reuse_existing(winner, expires_at).await;
                }
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    async fn apply(&self, id: i64, patch: ShortLinkPatch) -> Result<ShortLink, AppError> {
        self.link_repository
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": id })))
    }

    async fn invalidate(&self, code: &str) {
        if let Err(e) = self.cache.invalidate(code).await {
            tracing::warn!("Failed to invalidate cached link {}: {}", code, e);
        }
    }
}

fn ensure_future(expires_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
    match expires_at {
        Some(at) if at <= Utc::now() => Err(AppError::bad_request(
            "expiresAt must be in the future",
            json!({ "expiresAt": at }),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::NullCache;
    use chrono::Duration;

    fn link(id: i64, url: &str, is_active: bool, expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink {
            id,
            short_code: "AbC12XyZ".to_string(),
            original_url: url.to_string(),
            user_id: 1,
            is_active,
            expires_at,
            created_at: Utc::now(),
        }
    }

    fn service(repo: MockLinkRepository) -> LinkService<MockLinkRepository> {
        LinkService::new(Arc::new(repo), Arc::new(NullCache::new()))
    }

    #[tokio::test]
    async fn test_create_inserts_fresh_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_owner_and_url()
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_insert()
            .withf(|new| {
                new.user_id == 1
                    && new.original_url == "https://example.com"
                    && new.short_code.len() == SHORT_CODE_LENGTH
            })
            .times(1)
            .returning(|new| {
                let mut created = link(10, &new.original_url, true, None);
                created.short_code = new.short_code;
                Ok(InsertOutcome::Inserted(created))
            });

        let outcome = service(repo)
            .create(1, "https://example.com", None)
            .await
            .unwrap();

        assert_eq!(outcome.label(), "created");
        assert_eq!(outcome.link().id, 10);
    }

    #[tokio::test]
    async fn test_create_returns_existing_active_link() {
        let mut repo = MockLinkRepository::new();
        let existing = link(5, "https://example.com", true, None);
        repo.expect_find_by_owner_and_url()
            .times(1)
            .returning(move |_, _| Ok(Some(existing.clone())));
        repo.expect_insert().never();
        repo.expect_update().never();

        let outcome = service(repo)
            .create(1, "https://example.com", None)
            .await
            .unwrap();

        assert!(matches!(outcome, CreateOutcome::Existing(ref l) if l.id == 5));
    }

    #[tokio::test]
    async fn test_create_reactivates_inactive_link() {
        let mut repo = MockLinkRepository::new();
        let existing = link(5, "https://example.com", false, None);
        repo.expect_find_by_owner_and_url()
            .times(1)
            .returning(move |_, _| Ok(Some(existing.clone())));
        repo.expect_update()
            .withf(|id, patch| *id == 5 && patch.is_active == Some(true) && patch.expires_at.is_none())
            .times(1)
            .returning(|id, _| Ok(Some(link(id, "https://example.com", true, None))));

        let outcome = service(repo)
            .create(1, "https://example.com", None)
            .await
            .unwrap();

        assert_eq!(outcome.label(), "reactivated");
        assert_eq!(outcome.link().short_code, "AbC12XyZ");
    }

    #[tokio::test]
    async fn test_reactivation_clears_past_expiry() {
        let mut repo = MockLinkRepository::new();
        let existing = link(
            5,
            "https://example.com",
            false,
            Some(Utc::now() - Duration::days(1)),
        );
        repo.expect_find_by_owner_and_url()
            .returning(move |_, _| Ok(Some(existing.clone())));
        repo.expect_update()
            .withf(|_, patch| patch.expires_at == Some(None))
            .times(1)
            .returning(|id, _| Ok(Some(link(id, "https://example.com", true, None))));

        let outcome = service(repo)
            .create(1, "https://example.com", None)
            .await
            .unwrap();

        assert_eq!(outcome.link().expires_at, None);
    }

    #[tokio::test]
    async fn test_create_retries_on_code_collision() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_owner_and_url()
            .returning(|_, _| Ok(None));

        let mut calls = 0;
        repo.expect_insert().times(3).returning(move |new| {
            calls += 1;
            if calls < 3 {
                Ok(InsertOutcome::CodeTaken)
            } else {
                Ok(InsertOutcome::Inserted(link(11, &new.original_url, true, None)))
            }
        });

        let outcome = service(repo)
            .create(1, "https://example.com", None)
            .await
            .unwrap();

        assert_eq!(outcome.link().id, 11);
    }

    #[tokio::test]
    async fn test_create_gives_up_after_max_attempts() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_owner_and_url()
            .returning(|_, _| Ok(None));
        repo.expect_insert()
            .times(MAX_CODE_ATTEMPTS)
            .returning(|_| Ok(InsertOutcome::CodeTaken));

        let result = service(repo).create(1, "https://example.com", None).await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_create_lost_race_returns_winner() {
        let mut repo = MockLinkRepository::new();
        let mut lookups = 0;
        repo.expect_find_by_owner_and_url()
            .times(2)
            .returning(move |_, url| {
                lookups += 1;
                Ok((lookups > 1).then(|| link(42, url, true, None)))
            });
        repo.expect_insert()
            .times(1)
            .returning(|_| Ok(InsertOutcome::DuplicateUrl));

        let outcome = service(repo)
            .create(1, "https://example.com", None)
            .await
            .unwrap();

        assert!(matches!(outcome, CreateOutcome::Existing(ref l) if l.id == 42));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url_before_store_access() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_owner_and_url().never();

        let result = service(repo).create(1, "javascript:alert(1)", None).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_past_expiry() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_owner_and_url().never();

        let result = service(repo)
            .create(
                1,
                "https://example.com",
                Some(Utc::now() - Duration::minutes(1)),
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_get_hides_links_of_other_users() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id().returning(|id| {
            let mut other = link(id, "https://example.com", true, None);
            other.user_id = 99;
            Ok(Some(other))
        });

        let result = service(repo).get(1, 3).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deactivate_is_idempotent() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(link(id, "https://example.com", false, None))));
        repo.expect_update().never();

        let link = service(repo).deactivate(1, 3).await.unwrap();

        assert!(!link.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_active_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(link(id, "https://example.com", true, None))));
        repo.expect_update()
            .withf(|_, patch| *patch == ShortLinkPatch::deactivate())
            .times(1)
            .returning(|id, _| Ok(Some(link(id, "https://example.com", false, None))));

        let link = service(repo).deactivate(1, 3).await.unwrap();

        assert!(!link.is_active);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id().never();

        let result = service(repo)
            .update(1, 3, ShortLinkPatch::default())
            .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_propagates_url_conflict() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(link(id, "https://example.com", true, None))));
        repo.expect_update().returning(|_, _| {
            Err(AppError::conflict(
                "You already have a short link for this URL",
                json!({}),
            ))
        });

        let patch = ShortLinkPatch {
            original_url: Some("https://other.example.com".to_string()),
            ..ShortLinkPatch::default()
        };
        let result = service(repo).update(1, 3, patch).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_resolve_rejects_blank_code() {
        let repo = MockLinkRepository::new();
        let result = service(repo).resolve_for_redirect("  ").await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_resolve_malformed_code_skips_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().never();

        let result = service(repo).resolve_for_redirect("short").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_inactive_or_expired_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Ok(Some(link(1, "https://example.com", false, None))));
        let result = service(repo).resolve_for_redirect("AbC12XyZ").await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));

        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| {
            Ok(Some(link(
                1,
                "https://example.com",
                true,
                Some(Utc::now() - Duration::seconds(1)),
            )))
        });
        let result = service(repo).resolve_for_redirect("AbC12XyZ").await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_active_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|_| Ok(Some(link(7, "https://example.com/page", true, None))));

        let target = service(repo).resolve_for_redirect("AbC12XyZ").await.unwrap();

        assert_eq!(target.id, 7);
        assert_eq!(target.original_url, "https://example.com/page");
    }
}
