//! Offline IP-to-country lookup.
//!
//! The MaxMind reader is opened once at startup and shared read-only. When no
//! database is configured, [`NullCountryLookup`] answers `None` for every
//! address and the caller falls back to the unknown-country sentinel.

use std::net::IpAddr;
use std::path::Path;

use maxminddb::{Reader, geoip2};

/// Maps an IP address to an ISO 3166-1 alpha-2 country code.
pub trait CountryLookup: Send + Sync {
    /// Returns the country code for `ip`, or `None` if the address is not
    /// mapped.
    fn country_code(&self, ip: IpAddr) -> Option<String>;
}

/// GeoLite2-Country backed lookup.
pub struct MaxMindCountryLookup {
    reader: Reader<Vec<u8>>,
}

impl MaxMindCountryLookup {
    /// Opens an `.mmdb` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid MaxMind
    /// database.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let reader = Reader::open_readfile(path.as_ref())?;
        tracing::debug!(
            database_type = %reader.metadata.database_type,
            "GeoIP database opened"
        );
        Ok(Self { reader })
    }
}

impl CountryLookup for MaxMindCountryLookup {
    fn country_code(&self, ip: IpAddr) -> Option<String> {
        match self.reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => record
                .country
                .and_then(|country| country.iso_code)
                .map(str::to_string),
            Err(e) => {
                tracing::trace!(%ip, error = %e, "GeoIP lookup missed");
                None
            }
        }
    }
}

/// Lookup used when no GeoIP database is configured.
#[derive(Debug, Clone, Default)]
pub struct NullCountryLookup;

impl CountryLookup for NullCountryLookup {
    fn country_code(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_lookup_maps_nothing() {
        let lookup = NullCountryLookup;
        assert_eq!(lookup.country_code("8.8.8.8".parse().unwrap()), None);
        assert_eq!(lookup.country_code("::1".parse().unwrap()), None);
    }

    #[test]
    fn test_open_missing_database_fails() {
        assert!(MaxMindCountryLookup::open("/nonexistent/GeoLite2-Country.mmdb").is_err());
    }
}
