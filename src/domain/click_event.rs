//! Click event model for asynchronous redirect logging.

use std::net::IpAddr;

/// Raw client metadata captured by the redirect handler.
///
/// Passed to the background worker via a bounded channel so the redirect
/// response never waits on fingerprinting or the store. The worker turns it
/// into a [`crate::domain::entities::NewRedirectLog`]; the raw IP in this
/// event is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub short_link_id: i64,
    pub forwarded_for: Option<String>,
    pub peer_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClickEvent {
    /// Creates a new click event.
    ///
    /// # Arguments
    ///
    /// - `short_link_id` - The link that was resolved
    /// - `forwarded_for` - Raw `X-Forwarded-For` header, if present and valid text
    /// - `peer_ip` - Transport peer address
    /// - `user_agent` - Raw `User-Agent` header
    pub fn new(
        short_link_id: i64,
        forwarded_for: Option<&str>,
        peer_ip: Option<IpAddr>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            short_link_id,
            forwarded_for: forwarded_for.map(str::to_string),
            peer_ip,
            user_agent: user_agent.map(str::to_string),
        }
    }
}
