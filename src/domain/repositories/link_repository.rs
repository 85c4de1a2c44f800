//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Result of inserting a new link.
///
/// The two unique constraints on short links are reported separately so the
/// service can retry a code collision and fold a lost (owner, URL) race into
/// the existing row.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(ShortLink),
    /// Another link already uses the generated short code.
    CodeTaken,
    /// The owner already has a link for this URL.
    DuplicateUrl,
}

/// Repository interface for managing short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new active link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors. Constraint
    /// violations are reported through [`InsertOutcome`], not as errors.
    async fn insert(&self, new_link: NewShortLink) -> Result<InsertOutcome, AppError>;

    /// Finds a link by id regardless of owner or status.
    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, AppError>;

    /// Finds a link by its exact short code, active or not.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Finds the link a user already holds for a destination URL, active or not.
    async fn find_by_owner_and_url(
        &self,
        user_id: i64,
        original_url: &str,
    ) -> Result<Option<ShortLink>, AppError>;

    /// Lists a user's active links, newest first.
    async fn list_active_by_owner(&self, user_id: i64) -> Result<Vec<ShortLink>, AppError>;

    /// Applies a partial update.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` with the updated row
    /// - `Ok(None)` if no link has this id
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the new URL is already used by another
    /// link of the same owner.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, patch: ShortLinkPatch)
    -> Result<Option<ShortLink>, AppError>;

    /// Checks that the store answers queries.
    async fn ping(&self) -> Result<(), AppError>;
}
