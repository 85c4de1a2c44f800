//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and GeoIP setup, worker spawning,
//! and the Axum server lifecycle including graceful shutdown.

use crate::config::Config;
use crate::domain::click_worker::{ClickWorkerConfig, run_click_worker};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::geoip::{CountryLookup, MaxMindCountryLookup, NullCountryLookup};
use crate::infrastructure::persistence::{
    PgLinkRepository, PgRedirectLogRepository, PgUserRepository,
};
use crate::routes::{RouterOptions, app_router};
use crate::state::{AppState, Repositories, StateSettings};
use crate::utils::fingerprint::ClientFingerprinter;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - GeoIP reader (or a lookup that always misses)
/// - Background click worker
/// - Axum HTTP server
///
/// On Ctrl-C / SIGTERM the server stops accepting connections, finishes
/// in-flight requests, closes the click queue and waits for the worker to
/// flush.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Migrations applied");

    let cache = connect_cache(&config).await;
    let geo = open_geoip(&config);

    let pool = Arc::new(pool);
    let repositories = Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        links: Arc::new(PgLinkRepository::new(pool.clone())),
        redirect_logs: Arc::new(PgRedirectLogRepository::new(pool.clone())),
    };

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);

    let state = AppState::new(
        repositories,
        cache,
        ClientFingerprinter::new(geo),
        click_tx,
        StateSettings {
            public_base_url: config.public_base_url.clone(),
            jwt_secret: config.jwt_secret.clone(),
            jwt_ttl_seconds: config.jwt_ttl_seconds,
        },
    );

    let worker = tokio::spawn(run_click_worker(
        click_rx,
        state.analytics_service.clone(),
        ClickWorkerConfig {
            concurrency: config.click_worker_concurrency,
            write_retries: config.click_write_retries,
        },
    ));

    let options = RouterOptions {
        behind_proxy: config.behind_proxy,
        cors_allowed_origin: config.cors_origin_header(),
    };
    let app = app_router(state, &options);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    // The router owns the last click sender; dropping it when serve returns
    // closes the queue so the worker can drain and stop.
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, flushing click queue");
    if let Err(e) = worker.await {
        tracing::error!("Click worker terminated abnormally: {}", e);
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

fn open_geoip(config: &Config) -> Arc<dyn CountryLookup> {
    let Some(path) = &config.geoip_db_path else {
        tracing::info!("GeoIP disabled, countries recorded as unknown");
        return Arc::new(NullCountryLookup);
    };

    match MaxMindCountryLookup::open(path) {
        Ok(reader) => {
            tracing::info!(path = %path, "GeoIP database loaded");
            Arc::new(reader)
        }
        Err(e) => {
            tracing::warn!("Failed to open GeoIP database: {:#}. Countries recorded as unknown.", e);
            Arc::new(NullCountryLookup)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
