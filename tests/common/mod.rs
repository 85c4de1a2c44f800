#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo, middleware};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tower::Layer;

use linkpulse::api::handlers::not_found_handler;
use linkpulse::api::middleware::auth;
use linkpulse::api::routes;
use linkpulse::domain::click_event::ClickEvent;
use linkpulse::domain::entities::{
    LinkAnalytics, NewRedirectLog, NewShortLink, NewUser, RedirectLog, ShortLink,
    ShortLinkPatch, User,
};
use linkpulse::domain::repositories::{
    InsertOutcome, LinkRepository, RedirectLogRepository, UserRepository,
};
use linkpulse::error::AppError;
use linkpulse::infrastructure::cache::NullCache;
use linkpulse::infrastructure::geoip::CountryLookup;
use linkpulse::state::{AppState, Repositories, StateSettings};
use linkpulse::utils::fingerprint::ClientFingerprinter;

pub const TEST_PEER: &str = "127.0.0.1:12345";
pub const PUBLIC_BASE_URL: &str = "http://sho.rt";
pub const JWT_SECRET: &str = "test-jwt-secret";

// ── Database fixtures ───────────────────────────────────────────────────────

pub async fn create_test_user(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, name) VALUES ($1, 'hash', 'tester') RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_link(pool: &PgPool, code: &str, url: &str, user_id: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO short_links (short_code, original_url, user_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_log(
    pool: &PgPool,
    short_link_id: i64,
    country: &str,
    browser: &str,
    device: &str,
) {
    sqlx::query(
        "INSERT INTO redirect_logs (short_link_id, ip_hash, country, browser, device)
         VALUES ($1, 'hash', $2, $3, $4)",
    )
    .bind(short_link_id)
    .bind(country)
    .bind(browser)
    .bind(device)
    .execute(pool)
    .await
    .unwrap();
}

// ── Fake connect info ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = TEST_PEER.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

// ── In-memory repositories ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        let users = self.users.lock().unwrap();
        users.iter().find(|u| u.email == email).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "A user with this email already exists",
                json!({}),
            ));
        }

        let user = User {
            id: users.len() as i64 + 1,
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.get_by_email(email))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.lock().unwrap().clone())
    }
}

/// Link store enforcing the same uniqueness rules as the database:
/// unique short code, and one row per (owner, URL).
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<Vec<ShortLink>>,
}

impl InMemoryLinkRepository {
    /// Inserts a row directly, bypassing the service.
    pub fn seed(
        &self,
        code: &str,
        url: &str,
        user_id: i64,
        is_active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> ShortLink {
        let mut links = self.links.lock().unwrap();
        let link = ShortLink {
            id: links.len() as i64 + 1,
            short_code: code.to_string(),
            original_url: url.to_string(),
            user_id,
            is_active,
            expires_at,
            created_at: Utc::now(),
        };
        links.push(link.clone());
        link
    }

    pub fn get(&self, id: i64) -> Option<ShortLink> {
        self.links.lock().unwrap().iter().find(|l| l.id == id).cloned()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert(&self, new_link: NewShortLink) -> Result<InsertOutcome, AppError> {
        let mut links = self.links.lock().unwrap();

        if links.iter().any(|l| l.short_code == new_link.short_code) {
            return Ok(InsertOutcome::CodeTaken);
        }
        if links
            .iter()
            .any(|l| l.user_id == new_link.user_id && l.original_url == new_link.original_url)
        {
            return Ok(InsertOutcome::DuplicateUrl);
        }

        let link = ShortLink {
            id: links.len() as i64 + 1,
            short_code: new_link.short_code,
            original_url: new_link.original_url,
            user_id: new_link.user_id,
            is_active: true,
            expires_at: new_link.expires_at,
            created_at: Utc::now(),
        };
        links.push(link.clone());
        Ok(InsertOutcome::Inserted(link))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, AppError> {
        Ok(self.get(id))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links.iter().find(|l| l.short_code == code).cloned())
    }

    async fn find_by_owner_and_url(
        &self,
        user_id: i64,
        original_url: &str,
    ) -> Result<Option<ShortLink>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .find(|l| l.user_id == user_id && l.original_url == original_url)
            .cloned())
    }

    async fn list_active_by_owner(&self, user_id: i64) -> Result<Vec<ShortLink>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id && l.is_active)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, patch: ShortLinkPatch) -> Result<Option<ShortLink>, AppError> {
        let mut links = self.links.lock().unwrap();

        let Some(owner) = links.iter().find(|l| l.id == id).map(|l| l.user_id) else {
            return Ok(None);
        };

        if let Some(url) = &patch.original_url
            && links
                .iter()
                .any(|l| l.id != id && l.user_id == owner && &l.original_url == url)
        {
            return Err(AppError::conflict(
                "You already have a short link for this URL",
                json!({}),
            ));
        }

        let Some(link) = links.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        if let Some(url) = patch.original_url {
            link.original_url = url;
        }
        if let Some(active) = patch.is_active {
            link.is_active = active;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        Ok(Some(link.clone()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Redirect log store that can be switched into a failing mode.
pub struct InMemoryRedirectLogRepository {
    links: Arc<InMemoryLinkRepository>,
    logs: Mutex<Vec<RedirectLog>>,
    failing: AtomicBool,
}

impl InMemoryRedirectLogRepository {
    pub fn new(links: Arc<InMemoryLinkRepository>) -> Self {
        Self {
            links,
            logs: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn logs(&self) -> Vec<RedirectLog> {
        self.logs.lock().unwrap().clone()
    }

    pub fn seed(&self, short_link_id: i64, ip_hash: &str, country: &str, browser: &str, device: &str) {
        let mut logs = self.logs.lock().unwrap();
        let id = logs.len() as i64 + 1;
        logs.push(RedirectLog {
            id,
            short_link_id,
            ip_hash: ip_hash.to_string(),
            country: country.to_string(),
            browser: browser.to_string(),
            device: device.to_string(),
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl RedirectLogRepository for InMemoryRedirectLogRepository {
    async fn append(&self, new_log: NewRedirectLog) -> Result<RedirectLog, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::internal(
                "Internal server error",
                json!({ "source": "forced failure" }),
            ));
        }

        if self.links.get(new_log.short_link_id).is_none() {
            return Err(AppError::bad_request("Short link does not exist", json!({})));
        }

        let mut logs = self.logs.lock().unwrap();
        let log = RedirectLog {
            id: logs.len() as i64 + 1,
            short_link_id: new_log.short_link_id,
            ip_hash: new_log.ip_hash,
            country: new_log.country,
            browser: new_log.browser,
            device: new_log.device,
            created_at: Utc::now(),
        };
        logs.push(log.clone());
        Ok(log)
    }

    async fn summarize(&self, short_link_id: i64) -> Result<LinkAnalytics, AppError> {
        let logs = self.logs.lock().unwrap();
        Ok(LinkAnalytics::from_logs(
            logs.iter().filter(|l| l.short_link_id == short_link_id),
        ))
    }
}

/// Country lookup backed by a fixed table.
#[derive(Default)]
pub struct StaticCountryLookup {
    countries: HashMap<IpAddr, String>,
}

impl StaticCountryLookup {
    pub fn with(mut self, ip: &str, country: &str) -> Self {
        self.countries
            .insert(ip.parse().unwrap(), country.to_string());
        self
    }
}

impl CountryLookup for StaticCountryLookup {
    fn country_code(&self, ip: IpAddr) -> Option<String> {
        self.countries.get(&ip).cloned()
    }
}

// ── Test application ────────────────────────────────────────────────────────

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub links: Arc<InMemoryLinkRepository>,
    pub logs: Arc<InMemoryRedirectLogRepository>,
    pub click_rx: Option<mpsc::Receiver<ClickEvent>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_geo(StaticCountryLookup::default())
    }

    pub fn with_geo(geo: StaticCountryLookup) -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let links = Arc::new(InMemoryLinkRepository::default());
        let logs = Arc::new(InMemoryRedirectLogRepository::new(links.clone()));
        let (tx, rx) = mpsc::channel(100);

        let state = AppState::new(
            Repositories {
                users: users.clone(),
                links: links.clone(),
                redirect_logs: logs.clone(),
            },
            Arc::new(NullCache::new()),
            ClientFingerprinter::new(Arc::new(geo)),
            tx,
            StateSettings {
                public_base_url: PUBLIC_BASE_URL.to_string(),
                jwt_secret: JWT_SECRET.to_string(),
                jwt_ttl_seconds: None,
            },
        );

        let server = TestServer::new(app(state.clone())).unwrap();

        Self {
            server,
            state,
            users,
            links,
            logs,
            click_rx: Some(rx),
        }
    }

    /// Signs up and signs in, returning the access token.
    pub async fn register(&self, email: &str) -> String {
        self.server
            .post("/signup")
            .json(&json!({ "email": email, "password": "password1", "username": "tester" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = self
            .server
            .post("/signin")
            .json(&json!({ "email": email, "password": "password1" }))
            .await;
        response.assert_status_ok();

        response.json::<Value>()["data"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Creates a link through the API and returns the response body.
    pub async fn create_link(&self, token: &str, url: &str) -> Value {
        self.server
            .post("/shortLink")
            .add_header("token", token)
            .json(&json!({ "originalUrl": url }))
            .await
            .json::<Value>()
    }
}

/// Routes wired like production, minus rate limiting.
pub fn app(state: AppState) -> Router {
    let links = routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .merge(routes::account_routes())
        .merge(links)
        .merge(routes::public_routes())
        .fallback(not_found_handler)
        .layer(MockConnectInfoLayer)
        .with_state(state)
}
