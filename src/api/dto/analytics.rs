//! DTO for the per-link analytics endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{GroupCount, LinkAnalytics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserCount {
    pub browser: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device: String,
    pub count: i64,
}

/// Response data for `GET /shortLink/{id}/analytics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_clicks: i64,
    pub clicks_by_country: Vec<CountryCount>,
    pub clicks_by_browser: Vec<BrowserCount>,
    pub clicks_by_device: Vec<DeviceCount>,
}

impl From<LinkAnalytics> for AnalyticsResponse {
    fn from(a: LinkAnalytics) -> Self {
        fn map<T>(groups: Vec<GroupCount>, f: impl Fn(String, i64) -> T) -> Vec<T> {
            groups.into_iter().map(|g| f(g.key, g.count)).collect()
        }

        Self {
            total_clicks: a.total_clicks,
            clicks_by_country: map(a.by_country, |country, count| CountryCount { country, count }),
            clicks_by_browser: map(a.by_browser, |browser, count| BrowserCount { browser, count }),
            clicks_by_device: map(a.by_device, |device, count| DeviceCount { device, count }),
        }
    }
}
