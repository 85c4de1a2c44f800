//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, validation and business rules, and
//! give HTTP handlers a small API to call. They depend on repository traits
//! only, so handlers and tests can wire in any implementation.
//!
//! # Available Services
//!
//! - [`services::auth_service::AuthService`] - Signup, signin and token verification
//! - [`services::link_service::LinkService`] - Short link lifecycle and redirect resolution
//! - [`services::analytics_service::AnalyticsService`] - Redirect logging and per-link analytics

pub mod services;
