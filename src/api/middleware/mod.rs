//! HTTP middleware for request processing and protection.
//!
//! Provides authentication, CORS, rate limiting, and observability middleware.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod tracing;
