//! Utility functions for code generation, URL checks, and client fingerprinting.
//!
//! - [`code_generator`] - Random base62 short codes
//! - [`url_validator`] - Destination URL validation
//! - [`fingerprint`] - Client IP, IP hash, country, browser and device extraction
//! - [`password`] - Argon2 password hashing

pub mod code_generator;
pub mod fingerprint;
pub mod password;
pub mod url_validator;
