//! Redirect log entity and the aggregated analytics built from it.

use chrono::{DateTime, Utc};

/// Sentinel country code for unknown or unmapped clients.
pub const UNKNOWN_COUNTRY: &str = "UN";

/// One successful redirect through a short link.
///
/// Rows are append-only. Only the hashed IP is stored; the raw address never
/// reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectLog {
    pub id: i64,
    pub short_link_id: i64,
    pub ip_hash: String,
    pub country: String,
    pub browser: String,
    pub device: String,
    pub created_at: DateTime<Utc>,
}

/// Input data for appending a redirect log. The timestamp is set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedirectLog {
    pub short_link_id: i64,
    pub ip_hash: String,
    pub country: String,
    pub browser: String,
    pub device: String,
}

/// Click count for one value of a grouping key (a country, browser, or device).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

impl GroupCount {
    pub fn new(key: impl Into<String>, count: i64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Full-history click summary for a single link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkAnalytics {
    pub total_clicks: i64,
    pub by_country: Vec<GroupCount>,
    pub by_browser: Vec<GroupCount>,
    pub by_device: Vec<GroupCount>,
}

impl LinkAnalytics {
    /// Builds a summary from individual logs.
    ///
    /// Groups are ordered by count descending, then key ascending, matching
    /// the order produced by the store queries.
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a RedirectLog>) -> Self {
        use std::collections::BTreeMap;

        let mut countries: BTreeMap<&str, i64> = BTreeMap::new();
        let mut browsers: BTreeMap<&str, i64> = BTreeMap::new();
        let mut devices: BTreeMap<&str, i64> = BTreeMap::new();
        let mut total = 0;

        for log in logs {
            total += 1;
            *countries.entry(log.country.as_str()).or_default() += 1;
            *browsers.entry(log.browser.as_str()).or_default() += 1;
            *devices.entry(log.device.as_str()).or_default() += 1;
        }

        Self {
            total_clicks: total,
            by_country: ordered(countries),
            by_browser: ordered(browsers),
            by_device: ordered(devices),
        }
    }

    /// True when every grouping accounts for every click.
    pub fn is_consistent(&self) -> bool {
        let sum = |groups: &[GroupCount]| groups.iter().map(|g| g.count).sum::<i64>();
        sum(&self.by_country) == self.total_clicks
            && sum(&self.by_browser) == self.total_clicks
            && sum(&self.by_device) == self.total_clicks
    }
}

fn ordered(counts: std::collections::BTreeMap<&str, i64>) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(key, count)| GroupCount::new(key, count))
        .collect();
    // stable sort keeps the BTreeMap's ascending key order among equal counts
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}
