//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits using SQLx
//! runtime-checked queries mapped through `FromRow` row types.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - Accounts
//! - [`PgLinkRepository`] - Short links
//! - [`PgRedirectLogRepository`] - Redirect log and analytics queries

pub mod pg_link_repository;
pub mod pg_redirect_log_repository;
pub mod pg_user_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_redirect_log_repository::PgRedirectLogRepository;
pub use pg_user_repository::PgUserRepository;
