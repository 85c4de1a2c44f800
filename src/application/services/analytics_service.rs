//! Redirect logging and per-link analytics.

use std::sync::Arc;

use serde_json::json;

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{LinkAnalytics, NewRedirectLog, RedirectLog};
use crate::domain::repositories::{LinkRepository, RedirectLogRepository};
use crate::error::AppError;
use crate::utils::fingerprint::ClientFingerprinter;

/// Service for turning click events into redirect logs and summarizing them.
pub struct AnalyticsService<L, R>
where
    L: LinkRepository + ?Sized,
    R: RedirectLogRepository + ?Sized,
{
    link_repository: Arc<L>,
    log_repository: Arc<R>,
    fingerprinter: ClientFingerprinter,
}

impl<L, R> AnalyticsService<L, R>
where
    L: LinkRepository + ?Sized,
    R: RedirectLogRepository + ?Sized,
{
    pub fn new(
        link_repository: Arc<L>,
        log_repository: Arc<R>,
        fingerprinter: ClientFingerprinter,
    ) -> Self {
        Self {
            link_repository,
            log_repository,
            fingerprinter,
        }
    }

    /// Derives the privacy-reduced log row for a click.
    pub fn build_log(&self, event: &ClickEvent) -> NewRedirectLog {
        let fp = self.fingerprinter.fingerprint(
            event.forwarded_for.as_deref(),
            event.peer_ip,
            event.user_agent.as_deref(),
        );

        NewRedirectLog {
            short_link_id: event.short_link_id,
            ip_hash: fp.ip_hash,
            country: fp.country,
            browser: fp.browser,
            device: fp.device,
        }
    }

    /// Appends one redirect log.
    pub async fn append_log(&self, new_log: NewRedirectLog) -> Result<RedirectLog, AppError> {
        self.log_repository.append(new_log).await
    }

    /// Summarizes the click history of one of the caller's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs
    /// to another user.
    pub async fn link_analytics(&self, user_id: i64, id: i64) -> Result<LinkAnalytics, AppError> {
        let link = self
            .link_repository
            .find_by_id(id)
            .await?
            .filter(|link| link.is_owned_by(user_id))
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": id })))?;

        let analytics = self.log_repository.summarize(link.id).await?;

        if !analytics.is_consistent() {
            tracing::error!(link_id = link.id, "Analytics groupings disagree with total");
        }

        Ok(analytics)
    }
}
