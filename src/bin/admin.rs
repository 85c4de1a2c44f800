//! CLI administration tool for linkpulse.
//!
//! Provides commands for managing accounts and links, viewing statistics,
//! and performing database operations without requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # List accounts
//! cargo run --bin admin -- user list
//!
//! # Create an account (password generated when omitted)
//! cargo run --bin admin -- user create --email alice@example.com --username alice
//!
//! # Deactivate a short link by code
//! cargo run --bin admin -- link deactivate AbC12XyZ
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Connections are resolved like the server's:
//!
//! - `DATABASE_URL`, or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`
//! - `REDIS_URL`, or `REDIS_HOST`/`REDIS_PORT`/`REDIS_PASSWORD`/`REDIS_DB` (optional):
//!   drop cached entries of deactivated links
//! - `CACHE_TTL_SECONDS` (optional): TTL for the Redis connection defaults

use linkpulse::api::dto::auth::SignupRequest;
use linkpulse::config::StoreConfig;
use linkpulse::domain::entities::{NewUser, ShortLinkPatch};
use linkpulse::domain::repositories::{LinkRepository, UserRepository};
use linkpulse::infrastructure::cache::{CacheService, RedisCache};
use linkpulse::infrastructure::persistence::{PgLinkRepository, PgUserRepository};
use linkpulse::utils::password::hash_password;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// Length of generated passwords; inside the 8-20 signup bounds.
const GENERATED_PASSWORD_LEN: usize = 16;

/// CLI tool for managing linkpulse.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Account subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// List all accounts
    List,

    /// Create an account
    Create {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        username: Option<String>,

        /// Password (8-20 characters); generated if not provided
        #[arg(short, long)]
        password: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Link subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Deactivate a link by short code
    Deactivate {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let store = StoreConfig::from_env()?;

    let pool = PgPool::connect(&store.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Link { action } => handle_link_action(action, &pool, &store).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let repo = PgUserRepository::new(Arc::new(pool.clone()));

    match action {
        UserAction::List => list_users(&repo).await,
        UserAction::Create {
            email,
            username,
            password,
            yes,
        } => create_user(&repo, email, username, password, yes).await,
    }
}

async fn list_users(repo: &PgUserRepository) -> Result<()> {
    println!("{}", "👥 Accounts".bright_blue().bold());
    println!();

    let users = repo
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

    if users.is_empty() {
        println!("{}", "  No accounts found".yellow());
        println!();
        println!(
            "  Create one with: {} admin user create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<5} {:<35} {:<25} {:<20}",
        "ID".bright_white().bold(),
        "Email".bright_white().bold(),
        "Username".bright_white().bold(),
        "Created".bright_white().bold()
    );
    println!("  {}", "─".repeat(85).bright_black());

    for user in &users {
        println!(
            "  {:<5} {:<35} {:<25} {}",
            user.id.to_string().bright_black(),
            user.email.cyan(),
            user.name,
            user.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black()
        );
    }

    println!();
    println!("  Total: {}", users.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Creates an account with interactive prompts.
///
/// Input goes through the same validation as `POST /signup`. A generated
/// password is shown once and is not recoverable afterwards.
async fn create_user(
    repo: &PgUserRepository,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "👤 Create Account".bright_blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    let (password, generated) = match password {
        Some(p) => (p, false),
        None => (generate_password(), true),
    };

    let request = SignupRequest {
        email,
        password,
        username,
    };
    request
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid account details: {}", e))?;

    println!();
    println!("{}", "Account details:".bright_white().bold());
    println!("  Email:    {}", request.email.cyan());
    println!("  Username: {}", request.username.cyan());
    if generated {
        println!("  Password: {}", request.password.bright_yellow().bold());
        println!();
        println!(
            "{}",
            "⚠️  IMPORTANT: Save this password now! You won't be able to see it again."
                .red()
                .bold()
        );
    }
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this account?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    let user = repo
        .create(NewUser {
            email: request.email,
            password_hash,
            name: request.username,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create account: {}", e))?;

    println!();
    println!(
        "{} (id {})",
        "✅ Account created successfully!".green().bold(),
        user.id.to_string().bright_white()
    );
    println!();
    println!("{}", "Sign in with:".bright_white());
    println!(
        "  curl -X POST -H \"Content-Type: application/json\" -d '{{\"email\":\"{}\",\"password\":\"...\"}}' http://localhost:3000/signin",
        user.email
    );
    println!();

    Ok(())
}

async fn handle_link_action(action: LinkAction, pool: &PgPool, store: &StoreConfig) -> Result<()> {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    match action {
        LinkAction::Deactivate { code, yes } => deactivate_link(&repo, store, &code, yes).await,
    }
}

/// Deactivates a link with confirmation and drops its cached entry.
async fn deactivate_link(
    repo: &PgLinkRepository,
    store: &StoreConfig,
    code: &str,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔒 Deactivate Short Link".bright_blue().bold());
    println!();

    let link = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Short link not found")?;

    if !link.is_active {
        println!("{}", "⚠️  This link is already inactive".yellow());
        return Ok(());
    }

    println!("  Code:   {}", link.short_code.cyan());
    println!("  Target: {}", link.original_url);
    println!("  Owner:  {}", link.user_id.to_string().bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Deactivate this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    repo.update(link.id, ShortLinkPatch::deactivate())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to deactivate link: {}", e))?;

    invalidate_cached_link(store, &link.short_code).await;

    println!();
    println!("{}", "✅ Link deactivated successfully!".green().bold());
    println!();

    Ok(())
}

/// Drops the cached redirect target when Redis is configured.
async fn invalidate_cached_link(store: &StoreConfig, code: &str) {
    let Some(redis_url) = store.redis_url.as_deref() else {
        return;
    };

    match RedisCache::connect(redis_url, store.cache_ttl_seconds).await {
        Ok(cache) => {
            if let Err(e) = cache.invalidate(code).await {
                println!("{} {}", "⚠️  Failed to drop cached entry:".yellow(), e);
            }
        }
        Err(e) => println!("{} {}", "⚠️  Redis unavailable, cache not cleared:".yellow(), e),
    }
}

/// Displays system statistics.
///
/// Shows:
/// - Number of accounts
/// - Total and active links
/// - Total redirect logs
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
        .fetch_one(pool)
        .await?;

    let active_links_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM short_links WHERE is_active")
            .fetch_one(pool)
            .await?;

    let logs_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirect_logs")
        .fetch_one(pool)
        .await?;

    println!(
        "  Users:         {}",
        users_count.to_string().bright_green().bold()
    );
    println!(
        "  Links:         {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Active links:  {}",
        active_links_count.to_string().bright_green().bold()
    );
    println!(
        "  Redirects:     {}",
        logs_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

/// Generates a random alphanumeric password.
fn generate_password() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();

    (0..GENERATED_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
