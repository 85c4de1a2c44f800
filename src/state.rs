//! Application state shared across HTTP handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{AnalyticsService, AuthService, LinkService};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{LinkRepository, RedirectLogRepository, UserRepository};
use crate::infrastructure::cache::CacheService;
use crate::utils::fingerprint::ClientFingerprinter;

pub type DynAuthService = AuthService<dyn UserRepository>;
pub type DynLinkService = LinkService<dyn LinkRepository>;
pub type DynAnalyticsService = AnalyticsService<dyn LinkRepository, dyn RedirectLogRepository>;

/// Storage backends the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub links: Arc<dyn LinkRepository>,
    pub redirect_logs: Arc<dyn RedirectLogRepository>,
}

/// Service-level settings that come from configuration.
#[derive(Debug, Clone)]
pub struct StateSettings {
    /// Prefix of every `shortUrl`, without a trailing slash.
    pub public_base_url: String,
    pub jwt_secret: String,
    /// Token lifetime; `None` issues tokens without `exp`.
    pub jwt_ttl_seconds: Option<u64>,
}

/// Shared application state.
///
/// Cloned for each request (cheap due to `Arc`).
///
/// # Fields
///
/// - `auth_service` - account creation, sign-in and token verification
/// - `link_service` - link lifecycle and redirect resolution
/// - `analytics_service` - redirect logging and per-link summaries
/// - `cache` - cache backend, exposed for the health check
/// - `click_sender` - channel to the background click worker
/// - `public_base_url` - prefix used to build `shortUrl`
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<DynAuthService>,
    pub link_service: Arc<DynLinkService>,
    pub analytics_service: Arc<DynAnalyticsService>,
    pub cache: Arc<dyn CacheService>,
    pub click_sender: mpsc::Sender<ClickEvent>,
    pub public_base_url: Arc<str>,
}

impl AppState {
    /// Wires the services over the given repositories.
    pub fn new(
        repositories: Repositories,
        cache: Arc<dyn CacheService>,
        fingerprinter: ClientFingerprinter,
        click_sender: mpsc::Sender<ClickEvent>,
        settings: StateSettings,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(
            repositories.users,
            &settings.jwt_secret,
            settings.jwt_ttl_seconds,
        ));

        let link_service = Arc::new(LinkService::new(
            repositories.links.clone(),
            cache.clone(),
        ));

        let analytics_service = Arc::new(AnalyticsService::new(
            repositories.links,
            repositories.redirect_logs,
            fingerprinter,
        ));

        Self {
            auth_service,
            link_service,
            analytics_service,
            cache,
            click_sender,
            public_base_url: Arc::from(settings.public_base_url.trim_end_matches('/')),
        }
    }
}
