//! Client fingerprint extraction for redirect analytics.
//!
//! Everything here is a pure function of request metadata plus the read-only
//! GeoIP database. Raw IPs are hashed before they leave this module.

use std::net::IpAddr;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::entities::UNKNOWN_COUNTRY;
use crate::infrastructure::geoip::CountryLookup;

pub const UNKNOWN_BROWSER: &str = "Unknown";
pub const DEFAULT_DEVICE: &str = "desktop";

/// Privacy-reduced attributes of a requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub ip_hash: String,
    pub country: String,
    pub browser: String,
    pub device: String,
}

/// Resolves the client IP as text.
///
/// The first comma-separated entry of `X-Forwarded-For` wins when it is
/// non-blank; otherwise the transport peer address is used.
///
/// # Examples
///
/// ```ignore
/// let ip = resolve_client_ip(Some("203.0.113.7, 10.0.0.1"), None);
/// assert_eq!(ip.as_deref(), Some("203.0.113.7"));
/// ```
pub fn resolve_client_ip(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Option<String> {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|ip| ip.to_string()))
}

/// Lowercase hex SHA-256 of the IP text; empty when there is no IP.
pub fn hash_ip(ip: Option<&str>) -> String {
    match ip {
        Some(ip) => hex::encode(Sha256::digest(ip.as_bytes())),
        None => String::new(),
    }
}

/// Parses a User-Agent into `(browser, device)`.
///
/// Device classes are `mobile`, `tablet`, `console` and `desktop`; anything
/// unrecognized counts as `desktop`.
pub fn parse_user_agent(user_agent: Option<&str>) -> (String, String) {
    let parser = woothee::parser::Parser::new();
    let parsed = user_agent
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .and_then(|ua| parser.parse(ua));

    let Some(result) = parsed else {
        return (UNKNOWN_BROWSER.to_string(), DEFAULT_DEVICE.to_string());
    };

    let browser = if result.name.is_empty() || result.name == "UNKNOWN" {
        UNKNOWN_BROWSER
    } else {
        result.name
    };

    let device = match (result.category, result.os) {
        (_, "iPad") => "tablet",
        ("smartphone" | "mobilephone", _) => "mobile",
        ("appliance", _) => "console",
        _ => DEFAULT_DEVICE,
    };

    (browser.to_string(), device.to_string())
}

/// Builds [`Fingerprint`]s with a shared country lookup.
#[derive(Clone)]
pub struct ClientFingerprinter {
    geo: Arc<dyn CountryLookup>,
}

impl ClientFingerprinter {
    pub fn new(geo: Arc<dyn CountryLookup>) -> Self {
        Self { geo }
    }

    /// Country code for the IP text, or `"UN"` when it is absent,
    /// unparseable, or unmapped.
    pub fn country(&self, ip: Option<&str>) -> String {
        ip.and_then(|ip| ip.parse::<IpAddr>().ok())
            .and_then(|ip| self.geo.country_code(ip))
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }

    pub fn fingerprint(
        &self,
        forwarded_for: Option<&str>,
        peer: Option<IpAddr>,
        user_agent: Option<&str>,
    ) -> Fingerprint {
        let ip = resolve_client_ip(forwarded_for, peer);
        let (browser, device) = parse_user_agent(user_agent);

        Fingerprint {
            ip_hash: hash_ip(ip.as_deref()),
            country: self.country(ip.as_deref()),
            browser,
            device,
        }
    }
}
