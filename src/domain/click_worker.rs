//! Background worker that turns click events into redirect logs.
//!
//! The redirect handler only enqueues; fingerprinting and the store write
//! happen here, after the response has been sent. Failed writes are retried
//! a few times with exponential backoff, then logged and counted. Nothing in
//! this module can affect a redirect response.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::application::services::AnalyticsService;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{LinkRepository, RedirectLogRepository};
use crate::error::AppError;

/// Tuning for [`run_click_worker`].
#[derive(Debug, Clone, Copy)]
pub struct ClickWorkerConfig {
    /// Maximum number of log writes in flight.
    pub concurrency: usize,
    /// Extra attempts after a failed write.
    pub write_retries: usize,
}

impl Default for ClickWorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            write_retries: 2,
        }
    }
}

/// Consumes click events until every sender is dropped.
///
/// In-flight writes are awaited before returning, so a graceful shutdown
/// flushes what was already dequeued.
pub async fn run_click_worker<L, R>(
    mut rx: mpsc::Receiver<ClickEvent>,
    analytics: Arc<AnalyticsService<L, R>>,
    config: ClickWorkerConfig,
) where
    L: LinkRepository + ?Sized + 'static,
    R: RedirectLogRepository + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    tracing::info!(
        concurrency = config.concurrency,
        write_retries = config.write_retries,
        "Click worker started"
    );

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let analytics = analytics.clone();
        let retries = config.write_retries;
        tasks.spawn(async move {
            let _permit = permit;
            process_event(&analytics, event, retries).await;
        });

        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
    tracing::info!("Click worker stopped");
}

/// Fingerprints one event and writes it, retrying transient failures.
///
/// Returns whether the log row was written.
pub async fn process_event<L, R>(
    analytics: &AnalyticsService<L, R>,
    event: ClickEvent,
    write_retries: usize,
) -> bool
where
    L: LinkRepository + ?Sized,
    R: RedirectLogRepository + ?Sized,
{
    let new_log = analytics.build_log(&event);

    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(write_retries);

    let result = RetryIf::start(
        strategy,
        move || analytics.append_log(new_log.clone()),
        |e: &AppError| matches!(e, AppError::Internal { .. }),
    )
    .await;

    match result {
        Ok(log) => {
            metrics::counter!("redirect_logs_written_total").increment(1);
            tracing::debug!(
                link_id = log.short_link_id,
                country = %log.country,
                device = %log.device,
                "Redirect logged"
            );
            true
        }
        Err(e) => {
            metrics::counter!("redirect_log_failures_total").increment(1);
            tracing::error!(
                link_id = event.short_link_id,
                error = %e,
                "Failed to write redirect log"
            );
            false
        }
    }
}
