//! Repository trait for redirect logs and their aggregates.

use crate::domain::entities::{LinkAnalytics, NewRedirectLog, RedirectLog};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the append-only click log.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRedirectLogRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectLogRepository: Send + Sync {
    /// Appends one redirect log.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the referenced link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn append(&self, new_log: NewRedirectLog) -> Result<RedirectLog, AppError>;

    /// Summarizes the full click history of a link.
    ///
    /// The total and the three groupings must describe the same set of rows,
    /// so `total_clicks` equals the sum of every grouping.
    async fn summarize(&self, short_link_id: i64) -> Result<LinkAnalytics, AppError>;
}
