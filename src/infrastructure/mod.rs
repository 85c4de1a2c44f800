//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and geolocation.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`geoip`] - Offline IP-to-country lookup
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod geoip;
pub mod persistence;
