//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests, and `tests/common` carries in-memory ones for
//! the HTTP tests.
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - Registered accounts
//! - [`LinkRepository`] - Short link lifecycle
//! - [`RedirectLogRepository`] - Click log and analytics

pub mod link_repository;
pub mod redirect_log_repository;
pub mod user_repository;

pub use link_repository::{InsertOutcome, LinkRepository};
pub use redirect_log_repository::RedirectLogRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use redirect_log_repository::MockRedirectLogRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
